use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockbridge_core::{CompanyId, DomainError, DomainResult};

/// Minimum accepted length for a new password.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Company status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanyStatus {
    Active,
    Deleted,
}

impl CompanyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyStatus::Active => "active",
            CompanyStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> DomainResult<Self> {
        match s {
            "active" => Ok(CompanyStatus::Active),
            "deleted" => Ok(CompanyStatus::Deleted),
            other => Err(DomainError::validation(format!("unknown company status '{other}'"))),
        }
    }
}

/// A registered company (tenant).
///
/// `email` is unique across all records, including soft-deleted ones: a
/// soft-deleted company is reactivated on re-registration instead of being
/// duplicated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub status: CompanyStatus,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Public projection of a company (never exposes the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyProfile {
    pub id: CompanyId,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub status: CompanyStatus,
}

impl Company {
    /// Build a new active company from a validated registration.
    pub fn register(registration: &Registration, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: CompanyId::new(),
            name: registration.name.clone(),
            address: registration.address.clone(),
            phone: registration.phone.clone(),
            email: registration.email.clone(),
            password_hash,
            status: CompanyStatus::Active,
            created_at: now,
            deleted_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == CompanyStatus::Active && self.deleted_at.is_none()
    }

    /// Bring a soft-deleted company back with fresh registration details.
    ///
    /// The id is kept so historical orders and requests stay attached.
    pub fn reactivate(&mut self, registration: &Registration, password_hash: String) {
        self.name = registration.name.clone();
        self.address = registration.address.clone();
        self.phone = registration.phone.clone();
        self.password_hash = password_hash;
        self.status = CompanyStatus::Active;
        self.deleted_at = None;
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        self.status = CompanyStatus::Deleted;
        self.deleted_at = Some(now);
    }

    pub fn apply_profile(&mut self, update: &ProfileUpdate) {
        self.name = update.name.clone();
        self.address = update.address.clone();
        self.phone = update.phone.clone();
        self.email = update.email.clone();
    }

    pub fn profile(&self) -> CompanyProfile {
        CompanyProfile {
            id: self.id,
            name: self.name.clone(),
            address: self.address.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            status: self.status,
        }
    }
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    /// Trim credentials and check that every field is present.
    pub fn normalized(mut self) -> DomainResult<Self> {
        self.email = self.email.trim().to_string();
        self.password = self.password.trim().to_string();
        self.name = self.name.trim().to_string();

        if self.email.is_empty() || self.password.is_empty() {
            return Err(DomainError::validation("Email and password cannot be empty"));
        }
        if !looks_like_email(&self.email) {
            return Err(DomainError::validation("Email is not valid"));
        }
        if self.name.is_empty() || self.address.trim().is_empty() || self.phone.trim().is_empty() {
            return Err(DomainError::validation("Name, address and phone are required"));
        }
        Ok(self)
    }
}

/// What registering an email means given the record currently holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationPlan {
    Create,
    Reactivate(Company),
    AlreadyRegistered,
}

pub fn plan_registration(existing: Option<Company>) -> RegistrationPlan {
    match existing {
        None => RegistrationPlan::Create,
        Some(company) if company.is_active() => RegistrationPlan::AlreadyRegistered,
        Some(company) => RegistrationPlan::Reactivate(company),
    }
}

/// Settings update; requires the current password to be re-entered.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    #[serde(rename = "currentPassword")]
    pub current_password: String,
}

impl ProfileUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty()
            || self.address.trim().is_empty()
            || self.phone.trim().is_empty()
            || self.current_password.is_empty()
        {
            return Err(DomainError::validation("name, address, phone and currentPassword are required"));
        }
        if !looks_like_email(&self.email) {
            return Err(DomainError::validation("Email is not valid"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordChange {
    #[serde(rename = "currentPassword")]
    pub current_password: String,
    #[serde(rename = "newPassword")]
    pub new_password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
}

impl PasswordChange {
    pub fn validate(&self) -> DomainResult<()> {
        if self.current_password.is_empty() {
            return Err(DomainError::validation("currentPassword is required"));
        }
        if self.new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(DomainError::validation(format!(
                "newPassword must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.new_password != self.confirm_password {
            return Err(DomainError::validation("confirmPassword does not match newPassword"));
        }
        Ok(())
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}
