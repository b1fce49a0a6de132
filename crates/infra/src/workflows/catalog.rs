//! Products and warehouses.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use stockbridge_catalog::{
    NewProduct, NewWarehouse, Product, ProductListing, ProductUpdate, Warehouse, WarehouseDeletion,
};
use stockbridge_core::{CompanyId, ProductId, WarehouseId};
use stockbridge_permissions::PurchaseVisibility;

use super::{WorkflowError, WorkflowResult};
use crate::store::{Store, StoreError};

fn product_not_found() -> WorkflowError {
    WorkflowError::NotFound("Product not found".to_string())
}

fn warehouse_not_found() -> WorkflowError {
    WorkflowError::NotFound("Warehouse not found".to_string())
}

/// A missing warehouse named in a request body is a bad reference, not a 404.
fn unknown_warehouse(err: StoreError) -> WorkflowError {
    match err {
        StoreError::NotFound(msg) => WorkflowError::UnknownReference(msg),
        other => other.into(),
    }
}

async fn visibility(store: &dyn Store, buyer: CompanyId) -> WorkflowResult<PurchaseVisibility> {
    let requests = store.list_requests_by_requester(buyer).await?;
    Ok(PurchaseVisibility::for_buyer(buyer, &requests))
}

async fn owned_product(store: &dyn Store, caller: CompanyId, id: ProductId) -> WorkflowResult<Product> {
    let product = store.get_product(id).await?.ok_or_else(product_not_found)?;
    if !product.is_supplied_by(caller) {
        warn!(product_id = %id, "product change rejected: caller is not the supplier");
        return Err(WorkflowError::Forbidden(
            "Not authorized to modify this product".to_string(),
        ));
    }
    Ok(product)
}

async fn listing(store: &dyn Store, id: ProductId) -> WorkflowResult<ProductListing> {
    store
        .get_product_listing(id)
        .await?
        .ok_or_else(product_not_found)
}

#[instrument(skip(store), fields(company_id = %supplier), err)]
pub async fn list_own_products(store: &dyn Store, supplier: CompanyId) -> WorkflowResult<Vec<ProductListing>> {
    Ok(store.list_products_by_suppliers(&[supplier]).await?)
}

/// Products of other companies that have permitted `buyer`.
#[instrument(skip(store), fields(company_id = %buyer), err)]
pub async fn list_purchasable_products(store: &dyn Store, buyer: CompanyId) -> WorkflowResult<Vec<ProductListing>> {
    let visible = visibility(store, buyer).await?;
    let sellers: Vec<CompanyId> = visible.sellers().copied().filter(|s| visible.allows(*s)).collect();
    if sellers.is_empty() {
        return Ok(Vec::new());
    }
    Ok(store.list_products_by_suppliers(&sellers).await?)
}

#[instrument(skip(store, new, now), fields(company_id = %supplier), err)]
pub async fn create_product(
    store: &dyn Store,
    supplier: CompanyId,
    new: NewProduct,
    now: DateTime<Utc>,
) -> WorkflowResult<ProductListing> {
    new.validate()?;
    let product = store
        .create_product(&new, supplier, now)
        .await
        .map_err(unknown_warehouse)?;
    info!(product_id = %product.id, sku = %product.sku, "product registered");
    listing(store, product.id).await
}

/// A product is readable by its supplier and by buyers the supplier permitted.
#[instrument(skip(store), fields(company_id = %caller, product_id = %id), err)]
pub async fn get_product(store: &dyn Store, caller: CompanyId, id: ProductId) -> WorkflowResult<ProductListing> {
    let found = listing(store, id).await?;
    if found.supplier_id == caller || visibility(store, caller).await?.allows(found.supplier_id) {
        Ok(found)
    } else {
        Err(product_not_found())
    }
}

#[instrument(skip(store, update), fields(company_id = %caller, product_id = %id), err)]
pub async fn update_product(
    store: &dyn Store,
    caller: CompanyId,
    id: ProductId,
    update: ProductUpdate,
) -> WorkflowResult<ProductListing> {
    update.validate()?;
    owned_product(store, caller, id).await?;
    store.update_product(id, &update).await.map_err(|e| match e {
        StoreError::NotFound(msg) if update.warehouse_id.is_some() => WorkflowError::UnknownReference(msg),
        StoreError::NotFound(_) => product_not_found(),
        other => other.into(),
    })?;
    info!("product updated");
    listing(store, id).await
}

#[instrument(skip(store, now), fields(company_id = %caller, product_id = %id), err)]
pub async fn delete_product(
    store: &dyn Store,
    caller: CompanyId,
    id: ProductId,
    now: DateTime<Utc>,
) -> WorkflowResult<()> {
    owned_product(store, caller, id).await?;
    if !store.soft_delete_product(id, now).await? {
        return Err(product_not_found());
    }
    info!("product soft-deleted");
    Ok(())
}

#[instrument(skip(store), err)]
pub async fn list_warehouses(store: &dyn Store) -> WorkflowResult<Vec<Warehouse>> {
    Ok(store.list_warehouses().await?)
}

#[instrument(skip(store), fields(warehouse_id = %id), err)]
pub async fn get_warehouse(store: &dyn Store, id: WarehouseId) -> WorkflowResult<Warehouse> {
    store.get_warehouse(id).await?.ok_or_else(warehouse_not_found)
}

#[instrument(skip(store, new, now), err)]
pub async fn create_warehouse(store: &dyn Store, new: NewWarehouse, now: DateTime<Utc>) -> WorkflowResult<Warehouse> {
    new.validate()?;
    let warehouse = store.insert_warehouse(&new, now).await?;
    info!(warehouse_id = %warehouse.id, code = warehouse.code, "warehouse created");
    Ok(warehouse)
}

#[instrument(skip(store, update), fields(warehouse_id = %id), err)]
pub async fn update_warehouse(store: &dyn Store, id: WarehouseId, update: NewWarehouse) -> WorkflowResult<Warehouse> {
    update.validate()?;
    store
        .update_warehouse(id, &update)
        .await?
        .ok_or_else(warehouse_not_found)
}

#[instrument(skip(store, now), fields(warehouse_id = %id), err)]
pub async fn delete_warehouse(store: &dyn Store, id: WarehouseId, now: DateTime<Utc>) -> WorkflowResult<()> {
    match store.delete_warehouse_if_unreferenced(id, now).await? {
        WarehouseDeletion::Deleted => {
            info!("warehouse deleted");
            Ok(())
        }
        WarehouseDeletion::NotFound => Err(warehouse_not_found()),
        WarehouseDeletion::Referenced(count) => {
            warn!(references = count, "warehouse deletion blocked");
            Err(WorkflowError::Conflict(format!(
                "Warehouse is still referenced by {count} stock record(s)"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CompanyStore, InMemoryStore, PermissionStore};
    use stockbridge_catalog::WarehouseChoice;
    use stockbridge_companies::{Company, Registration};
    use stockbridge_permissions::{PermissionRequest, PermissionStatus};

    async fn company(store: &InMemoryStore, email: &str) -> CompanyId {
        let reg = Registration {
            name: email.to_string(),
            address: "addr".to_string(),
            phone: "555".to_string(),
            email: email.to_string(),
            password: "password1".to_string(),
        };
        let company = Company::register(&reg, "hash".to_string(), Utc::now());
        store.insert_company(&company).await.unwrap();
        company.id
    }

    fn new_product(warehouse: WarehouseChoice) -> NewProduct {
        NewProduct {
            product_name: "Widget".to_string(),
            description: "blue".to_string(),
            price: 1000,
            quantity: 10,
            warehouse,
        }
    }

    fn in_new_warehouse(name: &str) -> NewProduct {
        new_product(WarehouseChoice::New {
            name: name.to_string(),
            location: "Osaka".to_string(),
        })
    }

    #[tokio::test]
    async fn create_product_returns_listing_with_stock() {
        let store = InMemoryStore::new();
        let seller = company(&store, "s@example.com").await;

        let listing = create_product(&store, seller, in_new_warehouse("osaka"), Utc::now())
            .await
            .unwrap();

        assert_eq!(listing.sku, "WOS001-P001");
        assert_eq!(listing.quantity, 10);
        assert_eq!(listing.warehouse.as_deref(), Some("osaka"));
        assert_eq!(list_own_products(&store, seller).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_existing_warehouse_is_a_bad_reference() {
        let store = InMemoryStore::new();
        let seller = company(&store, "s@example.com").await;
        let err = create_product(
            &store,
            seller,
            new_product(WarehouseChoice::Existing(WarehouseId::new())),
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, WorkflowError::UnknownReference(_)));
    }

    #[tokio::test]
    async fn only_the_supplier_may_update_or_delete() {
        let store = InMemoryStore::new();
        let seller = company(&store, "s@example.com").await;
        let other = company(&store, "o@example.com").await;
        let product = create_product(&store, seller, in_new_warehouse("kobe"), Utc::now())
            .await
            .unwrap();

        let update = ProductUpdate {
            product_name: "Widget v2".to_string(),
            description: String::new(),
            price: 1200,
            quantity: 4,
            warehouse_id: None,
        };
        let err = update_product(&store, other, product.id, update.clone()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));
        let err = delete_product(&store, other, product.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Forbidden(_)));

        let updated = update_product(&store, seller, product.id, update).await.unwrap();
        assert_eq!(updated.sku, product.sku);
        assert_eq!(updated.price, 1200);
        assert_eq!(updated.quantity, 4);

        delete_product(&store, seller, product.id, Utc::now()).await.unwrap();
        let err = get_product(&store, seller, product.id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn purchase_listing_follows_permissions() {
        let store = InMemoryStore::new();
        let seller = company(&store, "s@example.com").await;
        let buyer = company(&store, "r@example.com").await;
        let outsider = company(&store, "r2@example.com").await;
        create_product(&store, seller, in_new_warehouse("nara"), Utc::now())
            .await
            .unwrap();

        let mut request = PermissionRequest::open(buyer, "r@example.com", "555", seller, Utc::now()).unwrap();
        store.insert_permission_request(&request).await.unwrap();
        assert!(list_purchasable_products(&store, buyer).await.unwrap().is_empty());

        request.decide(PermissionStatus::Permitted).unwrap();
        store
            .set_permission_status(request.id, request.status)
            .await
            .unwrap();

        let visible = list_purchasable_products(&store, buyer).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].supplier_name.as_deref(), Some("s@example.com"));
        assert!(list_purchasable_products(&store, outsider).await.unwrap().is_empty());
        assert!(get_product(&store, outsider, visible[0].id).await.is_err());
        assert!(get_product(&store, buyer, visible[0].id).await.is_ok());
    }

    #[tokio::test]
    async fn warehouse_delete_is_blocked_while_stocked() {
        let store = InMemoryStore::new();
        let seller = company(&store, "s@example.com").await;
        let product = create_product(&store, seller, in_new_warehouse("sendai"), Utc::now())
            .await
            .unwrap();
        let warehouse_id = product.warehouse_id.unwrap();

        let err = delete_warehouse(&store, warehouse_id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Conflict(_)));

        delete_product(&store, seller, product.id, Utc::now()).await.unwrap();
        delete_warehouse(&store, warehouse_id, Utc::now()).await.unwrap();
        let err = get_warehouse(&store, warehouse_id).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn warehouse_crud_round() {
        let store = InMemoryStore::new();
        let created = create_warehouse(
            &store,
            NewWarehouse {
                warehouse_name: "Main".to_string(),
                location: "Tokyo".to_string(),
            },
            Utc::now(),
        )
        .await
        .unwrap();
        let renamed = update_warehouse(
            &store,
            created.id,
            NewWarehouse {
                warehouse_name: "Annex".to_string(),
                location: "Chiba".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.code, created.code);
        assert_eq!(renamed.warehouse_name, "Annex");
        assert_eq!(list_warehouses(&store).await.unwrap().len(), 1);

        let blank = NewWarehouse {
            warehouse_name: " ".to_string(),
            location: String::new(),
        };
        assert!(matches!(
            create_warehouse(&store, blank, Utc::now()).await.unwrap_err(),
            WorkflowError::Validation(_)
        ));
    }
}
