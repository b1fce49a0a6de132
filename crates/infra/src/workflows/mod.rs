//! Application workflows.
//!
//! Each workflow loads what it needs through the store traits, applies the
//! pure domain rules from the domain crates, and persists the result. HTTP
//! knows nothing about the store and the store knows nothing about the rules.
//!
//! All failures surface as [`WorkflowError`]; a failed workflow leaves
//! persisted state unchanged.

pub mod catalog;
pub mod companies;
pub mod orders;
pub mod permissions;
pub mod reporting;

use thiserror::Error;

use stockbridge_companies::Company;
use stockbridge_core::{CompanyId, DomainError};

use crate::store::{Store, StoreError};

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),
    /// A body field names an entity that does not exist.
    #[error("{0}")]
    UnknownReference(String),
    /// The addressed entity does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The caller does not own the addressed entity.
    #[error("{0}")]
    Forbidden(String),
    /// A state precondition did not hold.
    #[error("{0}")]
    Conflict(String),
    /// A unique value is already taken.
    #[error("{0}")]
    Duplicate(String),
    /// Credentials were rejected.
    #[error("{0}")]
    Unauthenticated(String),
    #[error("store failure: {0}")]
    Store(StoreError),
    /// Signing or hashing failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for WorkflowError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate(msg) => WorkflowError::Duplicate(msg),
            other => WorkflowError::Store(other),
        }
    }
}

impl From<DomainError> for WorkflowError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => WorkflowError::Validation(msg),
            DomainError::InvariantViolation(msg) => WorkflowError::Validation(msg),
            DomainError::InvalidId(msg) => WorkflowError::Validation(msg),
            DomainError::Conflict(msg) => WorkflowError::Conflict(msg),
        }
    }
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Load the company a session acts for. A soft-deleted or unknown company
/// no longer authenticates, whatever its token says.
pub async fn acting_company(store: &dyn Store, company_id: CompanyId) -> WorkflowResult<Company> {
    store
        .get_company(company_id)
        .await?
        .filter(Company::is_active)
        .ok_or_else(|| WorkflowError::Unauthenticated("Company account is not active".to_string()))
}
