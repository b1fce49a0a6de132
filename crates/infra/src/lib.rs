//! Infrastructure layer: persistence adapters and workflow orchestration.

pub mod db;
pub mod store;
pub mod workflows;

pub use store::{
    CatalogStore, CompanyStore, InMemoryStore, OrderStore, PermissionStore, PostgresStore, Store,
    StoreError,
};
pub use workflows::WorkflowError;
