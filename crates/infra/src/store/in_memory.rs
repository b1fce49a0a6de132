use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockbridge_catalog::{
    InventoryStock, NewProduct, NewWarehouse, Product, ProductListing, ProductUpdate, Warehouse,
    WarehouseChoice, WarehouseDeletion, generate_sku,
};
use stockbridge_companies::Company;
use stockbridge_core::{CompanyId, OrderId, PermissionRequestId, ProductId, WarehouseId};
use stockbridge_orders::{CostSummary, Order, OrderStatus};
use stockbridge_permissions::{PermissionRequest, PermissionStatus};

use super::{CatalogStore, CompanyStore, OrderStore, PermissionStore, StoreError, StoreResult};

#[derive(Debug, Clone)]
struct StockRow {
    stock: InventoryStock,
    deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Tables {
    companies: HashMap<CompanyId, Company>,
    warehouses: HashMap<WarehouseId, Warehouse>,
    last_warehouse_code: i64,
    products: HashMap<ProductId, Product>,
    stocks: HashMap<ProductId, StockRow>,
    requests: Vec<PermissionRequest>,
    orders: Vec<Order>,
}

impl Tables {
    fn live_warehouse(&self, id: WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(&id).filter(|w| w.deleted_at.is_none())
    }

    fn listing(&self, product: &Product) -> ProductListing {
        let stock = self.stocks.get(&product.id).filter(|s| s.deleted_at.is_none());
        let warehouse = stock.and_then(|s| self.warehouses.get(&s.stock.warehouse_id));
        ProductListing {
            id: product.id,
            product_name: product.product_name.clone(),
            sku: product.sku.clone(),
            price: product.price,
            quantity: stock.map(|s| s.stock.quantity_in_stock).unwrap_or(0),
            description: product.description.clone(),
            warehouse: warehouse.map(|w| w.warehouse_name.clone()),
            warehouse_id: warehouse.map(|w| w.id),
            supplier_id: product.supplier_id,
            supplier_name: self.companies.get(&product.supplier_id).map(|c| c.name.clone()),
        }
    }

    fn next_sku(&self, warehouse: &Warehouse) -> String {
        let in_warehouse = self
            .stocks
            .values()
            .filter(|s| s.stock.warehouse_id == warehouse.id)
            .count() as u64;
        let taken: HashSet<&str> = self.products.values().map(|p| p.sku.as_str()).collect();

        let mut seq = in_warehouse + 1;
        loop {
            let sku = generate_sku(warehouse.code, &warehouse.warehouse_name, seq);
            if !taken.contains(sku.as_str()) {
                return sku;
            }
            seq += 1;
        }
    }

    fn insert_warehouse(&mut self, new: &NewWarehouse, now: DateTime<Utc>) -> Warehouse {
        self.last_warehouse_code += 1;
        let warehouse = Warehouse {
            id: WarehouseId::new(),
            code: self.last_warehouse_code,
            warehouse_name: new.warehouse_name.clone(),
            location: new.location.clone(),
            created_at: now,
            deleted_at: None,
        };
        self.warehouses.insert(warehouse.id, warehouse.clone());
        warehouse
    }
}

/// In-memory store for tests/dev. All tables sit behind one lock so that
/// multi-row writes are atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CompanyStore for InMemoryStore {
    async fn find_company_by_email(&self, email: &str) -> StoreResult<Option<Company>> {
        let t = self.read()?;
        Ok(t.companies.values().find(|c| c.email == email).cloned())
    }

    async fn get_company(&self, id: CompanyId) -> StoreResult<Option<Company>> {
        Ok(self.read()?.companies.get(&id).cloned())
    }

    async fn insert_company(&self, company: &Company) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.companies.values().any(|c| c.email == company.email) {
            return Err(StoreError::Duplicate(format!("email {}", company.email)));
        }
        t.companies.insert(company.id, company.clone());
        Ok(())
    }

    async fn update_company(&self, company: &Company) -> StoreResult<()> {
        let mut t = self.write()?;
        if t
            .companies
            .values()
            .any(|c| c.email == company.email && c.id != company.id)
        {
            return Err(StoreError::Duplicate(format!("email {}", company.email)));
        }
        match t.companies.get_mut(&company.id) {
            Some(existing) => {
                *existing = company.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("company {}", company.id))),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn insert_warehouse(&self, new: &NewWarehouse, now: DateTime<Utc>) -> StoreResult<Warehouse> {
        Ok(self.write()?.insert_warehouse(new, now))
    }

    async fn get_warehouse(&self, id: WarehouseId) -> StoreResult<Option<Warehouse>> {
        Ok(self.read()?.live_warehouse(id).cloned())
    }

    async fn list_warehouses(&self) -> StoreResult<Vec<Warehouse>> {
        let t = self.read()?;
        let mut out: Vec<_> = t
            .warehouses
            .values()
            .filter(|w| w.deleted_at.is_none())
            .cloned()
            .collect();
        out.sort_by_key(|w| w.code);
        Ok(out)
    }

    async fn update_warehouse(&self, id: WarehouseId, update: &NewWarehouse) -> StoreResult<Option<Warehouse>> {
        let mut t = self.write()?;
        let Some(w) = t.warehouses.get_mut(&id).filter(|w| w.deleted_at.is_none()) else {
            return Ok(None);
        };
        w.warehouse_name = update.warehouse_name.clone();
        w.location = update.location.clone();
        Ok(Some(w.clone()))
    }

    async fn delete_warehouse_if_unreferenced(
        &self,
        id: WarehouseId,
        now: DateTime<Utc>,
    ) -> StoreResult<WarehouseDeletion> {
        let mut t = self.write()?;
        if t.live_warehouse(id).is_none() {
            return Ok(WarehouseDeletion::NotFound);
        }
        let references = t
            .stocks
            .values()
            .filter(|s| s.stock.warehouse_id == id && s.deleted_at.is_none())
            .count() as u64;
        if references > 0 {
            return Ok(WarehouseDeletion::Referenced(references));
        }
        if let Some(w) = t.warehouses.get_mut(&id) {
            w.deleted_at = Some(now);
        }
        Ok(WarehouseDeletion::Deleted)
    }

    async fn create_product(
        &self,
        new: &NewProduct,
        supplier_id: CompanyId,
        now: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let mut t = self.write()?;
        let warehouse = match &new.warehouse {
            WarehouseChoice::Existing(id) => t
                .live_warehouse(*id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(format!("warehouse {id}")))?,
            WarehouseChoice::New { name, location } => {
                let fresh = NewWarehouse {
                    warehouse_name: name.clone(),
                    location: location.clone(),
                };
                t.insert_warehouse(&fresh, now)
            }
        };

        let sku = t.next_sku(&warehouse);
        let product = Product::register(new, supplier_id, sku, now);
        t.stocks.insert(
            product.id,
            StockRow {
                stock: InventoryStock::new(product.id, warehouse.id, new.quantity),
                deleted_at: None,
            },
        );
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.products.get(&id).filter(|p| p.is_active()).cloned())
    }

    async fn get_products(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let t = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| t.products.get(id))
            .filter(|p| p.is_active())
            .cloned()
            .collect())
    }

    async fn product_suppliers(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, CompanyId>> {
        let t = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| t.products.get(id).map(|p| (p.id, p.supplier_id)))
            .collect())
    }

    async fn get_product_listing(&self, id: ProductId) -> StoreResult<Option<ProductListing>> {
        let t = self.read()?;
        Ok(t.products
            .get(&id)
            .filter(|p| p.is_active())
            .map(|p| t.listing(p)))
    }

    async fn list_products_by_suppliers(&self, suppliers: &[CompanyId]) -> StoreResult<Vec<ProductListing>> {
        let t = self.read()?;
        let mut products: Vec<&Product> = t
            .products
            .values()
            .filter(|p| p.is_active() && suppliers.contains(&p.supplier_id))
            .collect();
        products.sort_by_key(|p| (p.created_at, *p.id.as_uuid()));
        Ok(products.into_iter().map(|p| t.listing(p)).collect())
    }

    async fn update_product(&self, id: ProductId, update: &ProductUpdate) -> StoreResult<Product> {
        let mut t = self.write()?;
        if let Some(wid) = update.warehouse_id {
            if t.live_warehouse(wid).is_none() {
                return Err(StoreError::NotFound(format!("warehouse {wid}")));
            }
        }
        let product = match t.products.get_mut(&id).filter(|p| p.is_active()) {
            Some(p) => {
                p.apply_update(update);
                p.clone()
            }
            None => return Err(StoreError::NotFound(format!("product {id}"))),
        };
        if let Some(row) = t.stocks.get_mut(&id) {
            row.stock.quantity_in_stock = update.quantity;
            if let Some(wid) = update.warehouse_id {
                row.stock.warehouse_id = wid;
            }
        }
        Ok(product)
    }

    async fn soft_delete_product(&self, id: ProductId, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut t = self.write()?;
        match t.products.get_mut(&id).filter(|p| p.is_active()) {
            Some(p) => p.soft_delete(now),
            None => return Ok(false),
        }
        if let Some(row) = t.stocks.get_mut(&id) {
            row.deleted_at = Some(now);
        }
        Ok(true)
    }
}

#[async_trait]
impl PermissionStore for InMemoryStore {
    async fn insert_permission_request(&self, request: &PermissionRequest) -> StoreResult<()> {
        self.write()?.requests.push(request.clone());
        Ok(())
    }

    async fn get_permission_request(&self, id: PermissionRequestId) -> StoreResult<Option<PermissionRequest>> {
        Ok(self.read()?.requests.iter().find(|r| r.id == id).cloned())
    }

    async fn list_requests_for_seller(&self, seller_id: CompanyId) -> StoreResult<Vec<PermissionRequest>> {
        let t = self.read()?;
        Ok(t.requests.iter().filter(|r| r.seller_id == seller_id).cloned().collect())
    }

    async fn list_requests_by_requester(&self, requester_id: CompanyId) -> StoreResult<Vec<PermissionRequest>> {
        let t = self.read()?;
        Ok(t.requests
            .iter()
            .filter(|r| r.requester_id == requester_id)
            .cloned()
            .collect())
    }

    async fn set_permission_status(
        &self,
        id: PermissionRequestId,
        status: PermissionStatus,
    ) -> StoreResult<Option<PermissionRequest>> {
        let mut t = self.write()?;
        Ok(t.requests.iter_mut().find(|r| r.id == id).map(|r| {
            r.status = status;
            r.clone()
        }))
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut t = self.write()?;
        if t.orders.iter().any(|o| o.id == order.id) {
            return Err(StoreError::Duplicate(format!("order {}", order.id)));
        }
        t.orders.push(order.clone());
        Ok(())
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        Ok(self.read()?.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn list_orders_for_buyer(&self, buyer_id: CompanyId) -> StoreResult<Vec<Order>> {
        let t = self.read()?;
        Ok(t.orders.iter().filter(|o| o.company_id == buyer_id).cloned().collect())
    }

    async fn list_orders_for_supplier(&self, supplier_id: CompanyId) -> StoreResult<Vec<Order>> {
        let t = self.read()?;
        let supplies = |pid: &ProductId| {
            t.products
                .get(pid)
                .is_some_and(|p| p.supplier_id == supplier_id)
        };
        Ok(t.orders
            .iter()
            .filter(|o| o.items.iter().any(|i| supplies(&i.product_id)))
            .cloned()
            .collect())
    }

    async fn advance_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let mut t = self.write()?;
        Ok(t.orders
            .iter_mut()
            .find(|o| o.id == id && o.status == expected)
            .map(|o| {
                o.status = next;
                o.clone()
            }))
    }

    async fn cost_summary(&self, company_id: CompanyId) -> StoreResult<CostSummary> {
        let t = self.read()?;
        CostSummary::compute(company_id, &t.orders, |pid| {
            t.products.get(&pid).map(|p| p.supplier_id)
        })
        .map_err(|e| StoreError::Corrupt(e.to_string()))
    }
}
