//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | Database (foreign key violation) | `23503` | `NotFound` |
//! | Database (other) | any other | `Backend` |
//! | PoolClosed / other | N/A | `Backend` |
//!
//! Multi-row writes run inside a transaction. Rows that gate a write (the
//! warehouse a product is stocked in, the warehouse being deleted) are locked
//! with `FOR UPDATE`/`FOR SHARE` so the check and the write cannot interleave
//! with a competing transaction.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;
use uuid::Uuid;

use stockbridge_catalog::{
    NewProduct, NewWarehouse, Product, ProductListing, ProductStatus, ProductUpdate, Warehouse,
    WarehouseChoice, WarehouseDeletion, generate_sku,
};
use stockbridge_companies::{Company, CompanyStatus};
use stockbridge_core::{CompanyId, OrderId, PermissionRequestId, ProductId, WarehouseId};
use stockbridge_orders::{CostSummary, Order, OrderItem, OrderStatus};
use stockbridge_permissions::{PermissionRequest, PermissionStatus};

use super::{CatalogStore, CompanyStore, OrderStore, PermissionStore, StoreError, StoreResult};

const COMPANY_COLUMNS: &str =
    "id, name, address, phone, email, password_hash, status, created_at, deleted_at";
const WAREHOUSE_COLUMNS: &str = "id, code, warehouse_name, location, created_at, deleted_at";
const PRODUCT_COLUMNS: &str =
    "id, product_name, sku, description, supplier_id, price, status, created_at, deleted_at";
const REQUEST_COLUMNS: &str =
    "id, seller_id, requester_id, requester_email, requester_phone, status, created_at";
const LISTING_SELECT: &str = r#"
    SELECT
        p.id,
        p.product_name,
        p.sku,
        p.price,
        p.description,
        p.supplier_id,
        COALESCE(s.quantity_in_stock, 0) AS quantity,
        w.id AS warehouse_id,
        w.warehouse_name,
        c.name AS supplier_name
    FROM products p
    LEFT JOIN inventory_stocks s ON s.product_id = p.id AND s.deleted_at IS NULL
    LEFT JOIN warehouses w ON w.id = s.warehouse_id
    LEFT JOIN companies c ON c.id = p.supplier_id
    WHERE p.status = 'active'
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    async fn begin(&self) -> StoreResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
    }

    async fn load_items(&self, order_ids: &[Uuid]) -> StoreResult<HashMap<Uuid, Vec<OrderItem>>> {
        if order_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query(
            r#"
            SELECT id, order_id, product_id, quantity, price
            FROM order_items
            WHERE order_id = ANY($1)
            ORDER BY order_id, line_no
            "#,
        )
        .bind(order_ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_order_items", e))?;

        let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
        for row in rows {
            let item = item_from_row(&row)?;
            items.entry(*item.order_id.as_uuid()).or_default().push(item);
        }
        Ok(items)
    }

    async fn attach_items(&self, rows: Vec<PgRow>) -> StoreResult<Vec<Order>> {
        let mut orders = rows.iter().map(order_from_row).collect::<StoreResult<Vec<_>>>()?;
        let ids: Vec<Uuid> = orders.iter().map(|o| *o.id.as_uuid()).collect();
        let mut items = self.load_items(&ids).await?;
        for order in &mut orders {
            order.items = items.remove(order.id.as_uuid()).unwrap_or_default();
        }
        Ok(orders)
    }
}

#[async_trait]
impl CompanyStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn find_company_by_email(&self, email: &str) -> StoreResult<Option<Company>> {
        let row = sqlx::query(&format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE email = $1"))
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_company_by_email", e))?;
        row.as_ref().map(company_from_row).transpose()
    }

    #[instrument(skip(self), fields(company_id = %id), err)]
    async fn get_company(&self, id: CompanyId) -> StoreResult<Option<Company>> {
        let row = sqlx::query(&format!("SELECT {COMPANY_COLUMNS} FROM companies WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_company", e))?;
        row.as_ref().map(company_from_row).transpose()
    }

    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn insert_company(&self, company: &Company) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO companies (id, name, address, phone, email, password_hash, status, created_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.password_hash)
        .bind(company.status.as_str())
        .bind(company.created_at)
        .bind(company.deleted_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_company", e))?;
        Ok(())
    }

    #[instrument(skip(self, company), fields(company_id = %company.id), err)]
    async fn update_company(&self, company: &Company) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE companies
            SET name = $2, address = $3, phone = $4, email = $5, password_hash = $6,
                status = $7, deleted_at = $8
            WHERE id = $1
            "#,
        )
        .bind(company.id.as_uuid())
        .bind(&company.name)
        .bind(&company.address)
        .bind(&company.phone)
        .bind(&company.email)
        .bind(&company.password_hash)
        .bind(company.status.as_str())
        .bind(company.deleted_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_company", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("company {}", company.id)));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PostgresStore {
    #[instrument(skip(self, new), err)]
    async fn insert_warehouse(&self, new: &NewWarehouse, now: DateTime<Utc>) -> StoreResult<Warehouse> {
        let row = sqlx::query(&format!(
            "INSERT INTO warehouses (id, warehouse_name, location, created_at) VALUES ($1, $2, $3, $4) RETURNING {WAREHOUSE_COLUMNS}"
        ))
        .bind(WarehouseId::new().as_uuid())
        .bind(&new.warehouse_name)
        .bind(&new.location)
        .bind(now)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_warehouse", e))?;
        warehouse_from_row(&row)
    }

    #[instrument(skip(self), fields(warehouse_id = %id), err)]
    async fn get_warehouse(&self, id: WarehouseId) -> StoreResult<Option<Warehouse>> {
        let row = sqlx::query(&format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1 AND deleted_at IS NULL"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_warehouse", e))?;
        row.as_ref().map(warehouse_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_warehouses(&self) -> StoreResult<Vec<Warehouse>> {
        let rows = sqlx::query(&format!(
            "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE deleted_at IS NULL ORDER BY code"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_warehouses", e))?;
        rows.iter().map(warehouse_from_row).collect()
    }

    #[instrument(skip(self, update), fields(warehouse_id = %id), err)]
    async fn update_warehouse(&self, id: WarehouseId, update: &NewWarehouse) -> StoreResult<Option<Warehouse>> {
        let row = sqlx::query(&format!(
            "UPDATE warehouses SET warehouse_name = $2, location = $3 WHERE id = $1 AND deleted_at IS NULL RETURNING {WAREHOUSE_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&update.warehouse_name)
        .bind(&update.location)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_warehouse", e))?;
        row.as_ref().map(warehouse_from_row).transpose()
    }

    #[instrument(skip(self), fields(warehouse_id = %id), err)]
    async fn delete_warehouse_if_unreferenced(
        &self,
        id: WarehouseId,
        now: DateTime<Utc>,
    ) -> StoreResult<WarehouseDeletion> {
        let mut tx = self.begin().await?;

        let locked = sqlx::query("SELECT id FROM warehouses WHERE id = $1 AND deleted_at IS NULL FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_warehouse", e))?;
        if locked.is_none() {
            return Ok(WarehouseDeletion::NotFound);
        }

        let references: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM inventory_stocks WHERE warehouse_id = $1 AND deleted_at IS NULL",
        )
        .bind(id.as_uuid())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("count_warehouse_references", e))?;
        if references > 0 {
            return Ok(WarehouseDeletion::Referenced(references as u64));
        }

        sqlx::query("UPDATE warehouses SET deleted_at = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_warehouse", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(WarehouseDeletion::Deleted)
    }

    #[instrument(skip(self, new), fields(supplier_id = %supplier_id), err)]
    async fn create_product(
        &self,
        new: &NewProduct,
        supplier_id: CompanyId,
        now: DateTime<Utc>,
    ) -> StoreResult<Product> {
        let mut tx = self.begin().await?;

        let warehouse_row = match &new.warehouse {
            WarehouseChoice::Existing(id) => sqlx::query(&format!(
                "SELECT {WAREHOUSE_COLUMNS} FROM warehouses WHERE id = $1 AND deleted_at IS NULL FOR UPDATE"
            ))
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("lock_warehouse", e))?
            .ok_or_else(|| StoreError::NotFound(format!("warehouse {id}")))?,
            WarehouseChoice::New { name, location } => sqlx::query(&format!(
                "INSERT INTO warehouses (id, warehouse_name, location, created_at) VALUES ($1, $2, $3, $4) RETURNING {WAREHOUSE_COLUMNS}"
            ))
            .bind(WarehouseId::new().as_uuid())
            .bind(name)
            .bind(location)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_warehouse", e))?,
        };
        let warehouse = warehouse_from_row(&warehouse_row)?;

        let in_warehouse: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM inventory_stocks WHERE warehouse_id = $1")
                .bind(warehouse.id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("count_warehouse_products", e))?;

        let mut seq = in_warehouse.max(0) as u64 + 1;
        let sku = loop {
            let candidate = generate_sku(warehouse.code, &warehouse.warehouse_name, seq);
            let taken: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE sku = $1)")
                .bind(&candidate)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("check_sku", e))?;
            if !taken {
                break candidate;
            }
            seq += 1;
        };

        let product = Product::register(new, supplier_id, sku, now);
        sqlx::query(
            r#"
            INSERT INTO products (id, product_name, sku, description, supplier_id, price, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.product_name)
        .bind(&product.sku)
        .bind(&product.description)
        .bind(product.supplier_id.as_uuid())
        .bind(product.price)
        .bind(product.status.as_str())
        .bind(product.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_product", e))?;

        sqlx::query(
            "INSERT INTO inventory_stocks (product_id, warehouse_id, quantity_in_stock) VALUES ($1, $2, $3)",
        )
        .bind(product.id.as_uuid())
        .bind(warehouse.id.as_uuid())
        .bind(new.quantity)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_stock", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<Product>> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND status = 'active'"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref().map(product_from_row).transpose()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_products(&self, ids: &[ProductId]) -> StoreResult<Vec<Product>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ANY($1) AND status = 'active'"
        ))
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_products", e))?;
        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn product_suppliers(&self, ids: &[ProductId]) -> StoreResult<HashMap<ProductId, CompanyId>> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query("SELECT id, supplier_id FROM products WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("product_suppliers", e))?;

        rows.iter()
            .map(|row| {
                let id: Uuid = get(row, "id")?;
                let supplier: Uuid = get(row, "supplier_id")?;
                Ok((ProductId::from_uuid(id), CompanyId::from_uuid(supplier)))
            })
            .collect()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product_listing(&self, id: ProductId) -> StoreResult<Option<ProductListing>> {
        let row = sqlx::query(&format!("{LISTING_SELECT} AND p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product_listing", e))?;
        row.as_ref().map(listing_from_row).transpose()
    }

    #[instrument(skip(self, suppliers), fields(count = suppliers.len()), err)]
    async fn list_products_by_suppliers(&self, suppliers: &[CompanyId]) -> StoreResult<Vec<ProductListing>> {
        let ids: Vec<Uuid> = suppliers.iter().map(|id| *id.as_uuid()).collect();
        let rows = sqlx::query(&format!(
            "{LISTING_SELECT} AND p.supplier_id = ANY($1) ORDER BY p.created_at, p.id"
        ))
        .bind(&ids)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products_by_suppliers", e))?;
        rows.iter().map(listing_from_row).collect()
    }

    #[instrument(skip(self, update), fields(product_id = %id), err)]
    async fn update_product(&self, id: ProductId, update: &ProductUpdate) -> StoreResult<Product> {
        let mut tx = self.begin().await?;

        if let Some(wid) = update.warehouse_id {
            let exists = sqlx::query("SELECT id FROM warehouses WHERE id = $1 AND deleted_at IS NULL FOR SHARE")
                .bind(wid.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("lock_warehouse", e))?;
            if exists.is_none() {
                return Err(StoreError::NotFound(format!("warehouse {wid}")));
            }
        }

        let row = sqlx::query(&format!(
            "UPDATE products SET product_name = $2, description = $3, price = $4 WHERE id = $1 AND status = 'active' RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(&update.product_name)
        .bind(&update.description)
        .bind(update.price)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_product", e))?
        .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        let product = product_from_row(&row)?;

        sqlx::query(
            r#"
            UPDATE inventory_stocks
            SET quantity_in_stock = $2, warehouse_id = COALESCE($3, warehouse_id)
            WHERE product_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.quantity)
        .bind(update.warehouse_id.map(Uuid::from))
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_stock", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(product)
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn soft_delete_product(&self, id: ProductId, now: DateTime<Utc>) -> StoreResult<bool> {
        let mut tx = self.begin().await?;

        let result = sqlx::query(
            "UPDATE products SET status = 'deleted', deleted_at = $2 WHERE id = $1 AND status = 'active'",
        )
        .bind(id.as_uuid())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("delete_product", e))?;
        if result.rows_affected() == 0 {
            return Ok(false);
        }

        sqlx::query("UPDATE inventory_stocks SET deleted_at = $2 WHERE product_id = $1")
            .bind(id.as_uuid())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("delete_stock", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(true)
    }
}

#[async_trait]
impl PermissionStore for PostgresStore {
    #[instrument(skip(self, request), fields(request_id = %request.id), err)]
    async fn insert_permission_request(&self, request: &PermissionRequest) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO permission_requests (id, seller_id, requester_id, requester_email, requester_phone, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(request.id.as_uuid())
        .bind(request.seller_id.as_uuid())
        .bind(request.requester_id.as_uuid())
        .bind(&request.requester_email)
        .bind(&request.requester_phone)
        .bind(request.status.as_str())
        .bind(request.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_permission_request", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(request_id = %id), err)]
    async fn get_permission_request(&self, id: PermissionRequestId) -> StoreResult<Option<PermissionRequest>> {
        let row = sqlx::query(&format!("SELECT {REQUEST_COLUMNS} FROM permission_requests WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_permission_request", e))?;
        row.as_ref().map(request_from_row).transpose()
    }

    #[instrument(skip(self), fields(seller_id = %seller_id), err)]
    async fn list_requests_for_seller(&self, seller_id: CompanyId) -> StoreResult<Vec<PermissionRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM permission_requests WHERE seller_id = $1 ORDER BY created_at, id"
        ))
        .bind(seller_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_requests_for_seller", e))?;
        rows.iter().map(request_from_row).collect()
    }

    #[instrument(skip(self), fields(requester_id = %requester_id), err)]
    async fn list_requests_by_requester(&self, requester_id: CompanyId) -> StoreResult<Vec<PermissionRequest>> {
        let rows = sqlx::query(&format!(
            "SELECT {REQUEST_COLUMNS} FROM permission_requests WHERE requester_id = $1 ORDER BY created_at, id"
        ))
        .bind(requester_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_requests_by_requester", e))?;
        rows.iter().map(request_from_row).collect()
    }

    #[instrument(skip(self), fields(request_id = %id, status = status.as_str()), err)]
    async fn set_permission_status(
        &self,
        id: PermissionRequestId,
        status: PermissionStatus,
    ) -> StoreResult<Option<PermissionRequest>> {
        let row = sqlx::query(&format!(
            "UPDATE permission_requests SET status = $2 WHERE id = $1 RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("set_permission_status", e))?;
        row.as_ref().map(request_from_row).transpose()
    }
}

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, order), fields(order_id = %order.id, item_count = order.items.len()), err)]
    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut tx = self.begin().await?;

        sqlx::query("INSERT INTO orders (id, company_id, total, status, order_date) VALUES ($1, $2, $3, $4, $5)")
            .bind(order.id.as_uuid())
            .bind(order.company_id.as_uuid())
            .bind(order.total)
            .bind(order.status.as_str())
            .bind(order.order_date)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order", e))?;

        for (line_no, item) in order.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, quantity, price, line_no)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(item.id.as_uuid())
            .bind(order.id.as_uuid())
            .bind(item.product_id.as_uuid())
            .bind(item.quantity)
            .bind(item.price)
            .bind(line_no as i32)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(())
    }

    #[instrument(skip(self), fields(order_id = %id), err)]
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let rows = sqlx::query("SELECT id, company_id, total, status, order_date FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_order", e))?;
        Ok(self.attach_items(rows).await?.pop())
    }

    #[instrument(skip(self), fields(buyer_id = %buyer_id), err)]
    async fn list_orders_for_buyer(&self, buyer_id: CompanyId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            "SELECT id, company_id, total, status, order_date FROM orders WHERE company_id = $1 ORDER BY order_date, id",
        )
        .bind(buyer_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders_for_buyer", e))?;
        self.attach_items(rows).await
    }

    #[instrument(skip(self), fields(supplier_id = %supplier_id), err)]
    async fn list_orders_for_supplier(&self, supplier_id: CompanyId) -> StoreResult<Vec<Order>> {
        let rows = sqlx::query(
            r#"
            SELECT o.id, o.company_id, o.total, o.status, o.order_date
            FROM orders o
            WHERE EXISTS (
                SELECT 1
                FROM order_items oi
                JOIN products p ON p.id = oi.product_id
                WHERE oi.order_id = o.id AND p.supplier_id = $1
            )
            ORDER BY o.order_date, o.id
            "#,
        )
        .bind(supplier_id.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_orders_for_supplier", e))?;
        self.attach_items(rows).await
    }

    #[instrument(skip(self), fields(order_id = %id, from = expected.as_str(), to = next.as_str()), err)]
    async fn advance_order_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        next: OrderStatus,
    ) -> StoreResult<Option<Order>> {
        let rows = sqlx::query(
            r#"
            UPDATE orders SET status = $3
            WHERE id = $1 AND status = $2
            RETURNING id, company_id, total, status, order_date
            "#,
        )
        .bind(id.as_uuid())
        .bind(expected.as_str())
        .bind(next.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("advance_order_status", e))?;
        Ok(self.attach_items(rows).await?.pop())
    }

    #[instrument(skip(self), fields(company_id = %company_id), err)]
    async fn cost_summary(&self, company_id: CompanyId) -> StoreResult<CostSummary> {
        let spent = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(total) FILTER (WHERE status = 'Completed'), 0)::BIGINT AS completed_spent,
                COALESCE(SUM(total) FILTER (WHERE status <> 'Completed'), 0)::BIGINT AS pending_spent
            FROM orders
            WHERE company_id = $1
            "#,
        )
        .bind(company_id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("cost_summary_spent", e))?;

        let earned = sqlx::query(
            r#"
            SELECT
                COALESCE(SUM(oi.price * oi.quantity) FILTER (WHERE o.status = 'Completed'), 0)::BIGINT AS completed_earned,
                COALESCE(SUM(oi.price * oi.quantity) FILTER (WHERE o.status <> 'Completed'), 0)::BIGINT AS pending_earned
            FROM order_items oi
            JOIN orders o ON o.id = oi.order_id
            JOIN products p ON p.id = oi.product_id
            WHERE p.supplier_id = $1
            "#,
        )
        .bind(company_id.as_uuid())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("cost_summary_earned", e))?;

        Ok(CostSummary {
            completed_spent: get(&spent, "completed_spent")?,
            pending_spent: get(&spent, "pending_spent")?,
            completed_earned: get(&earned, "completed_earned")?,
            pending_earned: get(&earned, "pending_earned")?,
        })
    }
}

fn get<'r, T>(row: &'r PgRow, column: &str) -> StoreResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Corrupt(format!("column {column}: {e}")))
}

fn company_from_row(row: &PgRow) -> StoreResult<Company> {
    let status: String = get(row, "status")?;
    Ok(Company {
        id: CompanyId::from_uuid(get(row, "id")?),
        name: get(row, "name")?,
        address: get(row, "address")?,
        phone: get(row, "phone")?,
        email: get(row, "email")?,
        password_hash: get(row, "password_hash")?,
        status: CompanyStatus::parse(&status).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at: get(row, "created_at")?,
        deleted_at: get(row, "deleted_at")?,
    })
}

fn warehouse_from_row(row: &PgRow) -> StoreResult<Warehouse> {
    Ok(Warehouse {
        id: WarehouseId::from_uuid(get(row, "id")?),
        code: get(row, "code")?,
        warehouse_name: get(row, "warehouse_name")?,
        location: get(row, "location")?,
        created_at: get(row, "created_at")?,
        deleted_at: get(row, "deleted_at")?,
    })
}

fn product_from_row(row: &PgRow) -> StoreResult<Product> {
    let status: String = get(row, "status")?;
    Ok(Product {
        id: ProductId::from_uuid(get(row, "id")?),
        product_name: get(row, "product_name")?,
        sku: get(row, "sku")?,
        description: get(row, "description")?,
        supplier_id: CompanyId::from_uuid(get(row, "supplier_id")?),
        price: get(row, "price")?,
        status: ProductStatus::parse(&status).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at: get(row, "created_at")?,
        deleted_at: get(row, "deleted_at")?,
    })
}

fn listing_from_row(row: &PgRow) -> StoreResult<ProductListing> {
    let warehouse_id: Option<Uuid> = get(row, "warehouse_id")?;
    Ok(ProductListing {
        id: ProductId::from_uuid(get(row, "id")?),
        product_name: get(row, "product_name")?,
        sku: get(row, "sku")?,
        price: get(row, "price")?,
        quantity: get(row, "quantity")?,
        description: get(row, "description")?,
        warehouse: get(row, "warehouse_name")?,
        warehouse_id: warehouse_id.map(WarehouseId::from_uuid),
        supplier_id: CompanyId::from_uuid(get(row, "supplier_id")?),
        supplier_name: get(row, "supplier_name")?,
    })
}

fn request_from_row(row: &PgRow) -> StoreResult<PermissionRequest> {
    let status: String = get(row, "status")?;
    Ok(PermissionRequest {
        id: PermissionRequestId::from_uuid(get(row, "id")?),
        seller_id: CompanyId::from_uuid(get(row, "seller_id")?),
        requester_id: CompanyId::from_uuid(get(row, "requester_id")?),
        requester_email: get(row, "requester_email")?,
        requester_phone: get(row, "requester_phone")?,
        status: PermissionStatus::parse(&status).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        created_at: get(row, "created_at")?,
    })
}

fn order_from_row(row: &PgRow) -> StoreResult<Order> {
    let status: String = get(row, "status")?;
    Ok(Order {
        id: OrderId::from_uuid(get(row, "id")?),
        company_id: CompanyId::from_uuid(get(row, "company_id")?),
        total: get(row, "total")?,
        status: OrderStatus::parse(&status).map_err(|e| StoreError::Corrupt(e.to_string()))?,
        order_date: get(row, "order_date")?,
        items: Vec::new(),
    })
}

fn item_from_row(row: &PgRow) -> StoreResult<OrderItem> {
    Ok(OrderItem {
        id: stockbridge_core::OrderItemId::from_uuid(get(row, "id")?),
        order_id: OrderId::from_uuid(get(row, "order_id")?),
        product_id: ProductId::from_uuid(get(row, "product_id")?),
        quantity: get(row, "quantity")?,
        price: get(row, "price")?,
    })
}

/// Map SQLx errors to `StoreError`.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Duplicate(msg),
                Some("23503") => StoreError::NotFound(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => StoreError::Backend(format!("connection pool closed in {operation}")),
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}
