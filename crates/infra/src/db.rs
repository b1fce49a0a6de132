//! Database connectivity: pool construction and embedded migrations.

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::store::StoreError;

/// Connect to Postgres with a bounded pool.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(|e| StoreError::Backend(format!("failed to connect: {e}")))?;
    info!(max_connections, "database pool ready");
    Ok(pool)
}

/// Apply pending migrations from `crates/infra/migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))?;
    info!("database migrations applied");
    Ok(())
}
