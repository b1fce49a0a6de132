//! Purchase visibility: which sellers' products a buyer may see.

use std::collections::HashSet;

use stockbridge_core::CompanyId;

use crate::request::{PermissionRequest, PermissionStatus};

/// The set of sellers that have permitted a given buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseVisibility {
    buyer: CompanyId,
    sellers: HashSet<CompanyId>,
}

impl PurchaseVisibility {
    /// Build from any set of requests; only permitted requests made by `buyer` count.
    pub fn for_buyer<'a, I>(buyer: CompanyId, requests: I) -> Self
    where
        I: IntoIterator<Item = &'a PermissionRequest>,
    {
        let sellers = requests
            .into_iter()
            .filter(|r| r.requester_id == buyer && r.status == PermissionStatus::Permitted)
            .map(|r| r.seller_id)
            .collect();
        Self { buyer, sellers }
    }

    /// A buyer never sees its own products in the purchase listing.
    pub fn allows(&self, supplier: CompanyId) -> bool {
        self.buyer != supplier && self.sellers.contains(&supplier)
    }

    pub fn sellers(&self) -> impl Iterator<Item = &CompanyId> {
        self.sellers.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn request(requester: CompanyId, seller: CompanyId, status: PermissionStatus) -> PermissionRequest {
        let mut req = PermissionRequest::open(requester, "r@example.com", "1", seller, Utc::now()).unwrap();
        req.status = status;
        req
    }

    #[test]
    fn permitted_seller_is_visible_only_to_its_requester() {
        let (r, r2, s) = (CompanyId::new(), CompanyId::new(), CompanyId::new());
        let requests = vec![request(r, s, PermissionStatus::Permitted)];

        assert!(PurchaseVisibility::for_buyer(r, &requests).allows(s));
        assert!(!PurchaseVisibility::for_buyer(r2, &requests).allows(s));
    }

    #[test]
    fn buyer_never_sees_itself() {
        let (r, s) = (CompanyId::new(), CompanyId::new());
        let mut own = request(r, s, PermissionStatus::Permitted);
        own.seller_id = r;
        let visible = PurchaseVisibility::for_buyer(r, &[own]);
        assert!(!visible.allows(r));
        assert_eq!(visible.sellers().count(), 1);
    }

    proptest! {
        #[test]
        fn only_permitted_status_grants_visibility(status_idx in 0usize..3) {
            let status = [PermissionStatus::Pending, PermissionStatus::Permitted, PermissionStatus::Rejected][status_idx];
            let (r, s) = (CompanyId::new(), CompanyId::new());
            let requests = vec![request(r, s, status)];
            let visible = PurchaseVisibility::for_buyer(r, &requests).allows(s);
            prop_assert_eq!(visible, status == PermissionStatus::Permitted);
        }
    }
}
