use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbridge_core::{CompanyId, DomainError, DomainResult, PermissionRequestId};

/// Permission request status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Pending,
    Permitted,
    Rejected,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Pending => "pending",
            PermissionStatus::Permitted => "permitted",
            PermissionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "pending" => Ok(PermissionStatus::Pending),
            "permitted" => Ok(PermissionStatus::Permitted),
            "rejected" => Ok(PermissionStatus::Rejected),
            other => Err(DomainError::validation(format!("unknown permission status '{other}'"))),
        }
    }

    /// Parse a status a seller may set. `pending` is never a valid target.
    pub fn parse_decision(s: &str) -> DomainResult<Self> {
        match s {
            "permitted" => Ok(PermissionStatus::Permitted),
            "rejected" => Ok(PermissionStatus::Rejected),
            _ => Err(DomainError::validation("Invalid status")),
        }
    }
}

/// A requester's ask for visibility into a seller's products.
///
/// `requester_email` and `requester_phone` are copies taken when the request
/// was made; later profile edits do not touch them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PermissionRequest {
    pub id: PermissionRequestId,
    pub seller_id: CompanyId,
    pub requester_id: CompanyId,
    pub requester_email: String,
    pub requester_phone: String,
    pub status: PermissionStatus,
    pub created_at: DateTime<Utc>,
}

impl PermissionRequest {
    pub fn open(
        requester_id: CompanyId,
        requester_email: &str,
        requester_phone: &str,
        seller_id: CompanyId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if requester_id == seller_id {
            return Err(DomainError::invariant("cannot request permission from your own company"));
        }
        Ok(Self {
            id: PermissionRequestId::new(),
            seller_id,
            requester_id,
            requester_email: requester_email.to_string(),
            requester_phone: requester_phone.to_string(),
            status: PermissionStatus::Pending,
            created_at: now,
        })
    }

    /// Ownership guard for status changes.
    pub fn ensure_seller(&self, caller: CompanyId) -> DomainResult<()> {
        if self.seller_id != caller {
            return Err(DomainError::invariant("Not authorized to update this request"));
        }
        Ok(())
    }

    /// Set a seller decision. Re-applying the current status is a no-op success,
    /// and a permitted request may later be rejected (revocation).
    pub fn decide(&mut self, status: PermissionStatus) -> DomainResult<()> {
        if status == PermissionStatus::Pending {
            return Err(DomainError::validation("Invalid status"));
        }
        self.status = status;
        Ok(())
    }
}

/// Exact-match filter on the requester snapshot. Empty filters are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RequestFilter {
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl RequestFilter {
    pub fn normalized(self) -> Self {
        let clean = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self {
            email: clean(self.email),
            phone: clean(self.phone),
        }
    }

    pub fn matches(&self, request: &PermissionRequest) -> bool {
        self.email.as_deref().is_none_or(|e| e == request.requester_email)
            && self.phone.as_deref().is_none_or(|p| p == request.requester_phone)
    }
}
