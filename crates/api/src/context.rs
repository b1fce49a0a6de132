use stockbridge_core::CompanyId;

/// Authenticated company for a request, taken from validated session claims.
///
/// Inserted by the auth middleware; every protected handler reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyContext {
    company_id: CompanyId,
    email: String,
}

impl CompanyContext {
    pub fn new(company_id: CompanyId, email: String) -> Self {
        Self { company_id, email }
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}
