//! Registration, login and account settings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use stockbridge_auth::{TokenIssuer, hash_password, verify_password};
use stockbridge_companies::{
    Company, CompanyProfile, PasswordChange, ProfileUpdate, Registration, RegistrationPlan,
    plan_registration,
};
use stockbridge_core::CompanyId;

use super::{WorkflowError, WorkflowResult};
use crate::store::Store;

/// Successful login: identity plus the signed session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub email: String,
    pub company_id: CompanyId,
    pub token: String,
}

fn hash(password: &str) -> WorkflowResult<String> {
    hash_password(password).map_err(|e| WorkflowError::Internal(e.to_string()))
}

async fn active_company(store: &dyn Store, company_id: CompanyId) -> WorkflowResult<Company> {
    store
        .get_company(company_id)
        .await?
        .filter(Company::is_active)
        .ok_or_else(|| WorkflowError::NotFound("Company not found".to_string()))
}

/// Register a company, or reactivate a soft-deleted one holding the same email.
///
/// Returns the profile and whether it was reactivated.
#[instrument(skip(store, registration, now), err)]
pub async fn register(
    store: &dyn Store,
    registration: Registration,
    now: DateTime<Utc>,
) -> WorkflowResult<(CompanyProfile, bool)> {
    let registration = registration.normalized()?;

    match plan_registration(store.find_company_by_email(&registration.email).await?) {
        RegistrationPlan::AlreadyRegistered => {
            warn!("registration rejected: email already registered");
            Err(WorkflowError::Duplicate("Email already registered".to_string()))
        }
        RegistrationPlan::Reactivate(mut company) => {
            company.reactivate(&registration, hash(&registration.password)?);
            store.update_company(&company).await?;
            info!(company_id = %company.id, "company reactivated");
            Ok((company.profile(), true))
        }
        RegistrationPlan::Create => {
            let company = Company::register(&registration, hash(&registration.password)?, now);
            store.insert_company(&company).await?;
            info!(company_id = %company.id, "company registered");
            Ok((company.profile(), false))
        }
    }
}

#[instrument(skip(store, tokens, password, now), err)]
pub async fn login(
    store: &dyn Store,
    tokens: &dyn TokenIssuer,
    email: &str,
    password: &str,
    now: DateTime<Utc>,
) -> WorkflowResult<LoginOutcome> {
    let email = email.trim();
    let password = password.trim();
    let invalid = || WorkflowError::Unauthenticated("Invalid credentials".to_string());

    let company = store
        .find_company_by_email(email)
        .await?
        .filter(Company::is_active)
        .ok_or_else(invalid)?;
    if !verify_password(password, &company.password_hash) {
        warn!(company_id = %company.id, "login rejected: wrong password");
        return Err(invalid());
    }

    let token = tokens
        .issue(&company.email, company.id, now)
        .map_err(|e| WorkflowError::Internal(e.to_string()))?;
    info!(company_id = %company.id, "login succeeded");
    Ok(LoginOutcome {
        email: company.email,
        company_id: company.id,
        token,
    })
}

#[instrument(skip(store), fields(company_id = %company_id), err)]
pub async fn profile(store: &dyn Store, company_id: CompanyId) -> WorkflowResult<CompanyProfile> {
    Ok(active_company(store, company_id).await?.profile())
}

#[instrument(skip(store, update), fields(company_id = %company_id), err)]
pub async fn update_profile(
    store: &dyn Store,
    company_id: CompanyId,
    update: ProfileUpdate,
) -> WorkflowResult<CompanyProfile> {
    update.validate()?;
    let mut company = active_company(store, company_id).await?;
    if !verify_password(&update.current_password, &company.password_hash) {
        return Err(WorkflowError::Validation("Current password is incorrect".to_string()));
    }

    company.apply_profile(&update);
    store.update_company(&company).await?;
    info!("profile updated");
    Ok(company.profile())
}

#[instrument(skip(store, change), fields(company_id = %company_id), err)]
pub async fn change_password(
    store: &dyn Store,
    company_id: CompanyId,
    change: PasswordChange,
) -> WorkflowResult<()> {
    change.validate()?;
    let mut company = active_company(store, company_id).await?;
    if !verify_password(&change.current_password, &company.password_hash) {
        return Err(WorkflowError::Validation("Current password is incorrect".to_string()));
    }

    company.password_hash = hash(&change.new_password)?;
    store.update_company(&company).await?;
    info!("password changed");
    Ok(())
}

#[instrument(skip(store, now), fields(company_id = %company_id), err)]
pub async fn delete_account(store: &dyn Store, company_id: CompanyId, now: DateTime<Utc>) -> WorkflowResult<()> {
    let mut company = active_company(store, company_id).await?;
    company.soft_delete(now);
    store.update_company(&company).await?;
    info!("company soft-deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use stockbridge_auth::{Hs256TokenService, TokenConfig, TokenValidator};

    fn registration(email: &str, password: &str) -> Registration {
        Registration {
            name: "Acme".to_string(),
            address: "1 Main St".to_string(),
            phone: "555-0100".to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn tokens() -> Hs256TokenService {
        Hs256TokenService::new(TokenConfig {
            secret: b"test-secret".to_vec(),
            ttl: chrono::Duration::hours(1),
        })
    }

    #[tokio::test]
    async fn register_then_login_issues_a_valid_token() {
        let store = InMemoryStore::new();
        let tokens = tokens();
        let (profile, reactivated) = register(&store, registration(" acme@example.com ", "password1"), Utc::now())
            .await
            .unwrap();
        assert!(!reactivated);
        assert_eq!(profile.email, "acme@example.com");

        let outcome = login(&store, &tokens, "acme@example.com", "password1", Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.company_id, profile.id);

        let claims = tokens.validate(&outcome.token, Utc::now()).unwrap();
        assert_eq!(claims.company_id, profile.id);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let store = InMemoryStore::new();
        register(&store, registration("a@example.com", "password1"), Utc::now()).await.unwrap();
        let err = register(&store, registration("a@example.com", "password2"), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Duplicate(_)));
    }

    #[tokio::test]
    async fn wrong_password_is_unauthenticated() {
        let store = InMemoryStore::new();
        register(&store, registration("a@example.com", "password1"), Utc::now()).await.unwrap();
        let err = login(&store, &tokens(), "a@example.com", "nope", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn deleted_account_reactivates_with_same_id() {
        let store = InMemoryStore::new();
        let (first, _) = register(&store, registration("a@example.com", "password1"), Utc::now())
            .await
            .unwrap();
        delete_account(&store, first.id, Utc::now()).await.unwrap();

        let err = login(&store, &tokens(), "a@example.com", "password1", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unauthenticated(_)));

        let (again, reactivated) = register(&store, registration("a@example.com", "password2"), Utc::now())
            .await
            .unwrap();
        assert!(reactivated);
        assert_eq!(again.id, first.id);
        login(&store, &tokens(), "a@example.com", "password2", Utc::now())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn settings_require_current_password() {
        let store = InMemoryStore::new();
        let (me, _) = register(&store, registration("a@example.com", "password1"), Utc::now())
            .await
            .unwrap();

        let update = ProfileUpdate {
            name: "Acme Two".to_string(),
            address: "2 Main St".to_string(),
            phone: "555-0199".to_string(),
            email: "a@example.com".to_string(),
            current_password: "wrong".to_string(),
        };
        let err = update_profile(&store, me.id, update.clone()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Validation(_)));

        let ok = ProfileUpdate {
            current_password: "password1".to_string(),
            ..update
        };
        assert_eq!(update_profile(&store, me.id, ok).await.unwrap().name, "Acme Two");
    }

    #[tokio::test]
    async fn password_change_takes_effect() {
        let store = InMemoryStore::new();
        let (me, _) = register(&store, registration("a@example.com", "password1"), Utc::now())
            .await
            .unwrap();
        change_password(
            &store,
            me.id,
            PasswordChange {
                current_password: "password1".to_string(),
                new_password: "password-two".to_string(),
                confirm_password: "password-two".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(login(&store, &tokens(), "a@example.com", "password1", Utc::now()).await.is_err());
        assert!(login(&store, &tokens(), "a@example.com", "password-two", Utc::now()).await.is_ok());
    }
}
