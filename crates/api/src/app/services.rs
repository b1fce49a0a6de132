//! Service wiring: store selection and the token service.

use std::sync::Arc;

use tracing::info;

use stockbridge_auth::{Hs256TokenService, TokenConfig};
use stockbridge_infra::store::SharedStore;
use stockbridge_infra::{InMemoryStore, PostgresStore, StoreError, db};

use crate::config::AppConfig;

/// Session cookie settings used when issuing tokens at login.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub max_age_secs: i64,
}

/// Everything handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub store: SharedStore,
    pub tokens: Arc<Hs256TokenService>,
    pub session: SessionSettings,
}

impl AppServices {
    pub fn new(store: SharedStore, token_config: TokenConfig, cookie_name: impl Into<String>) -> Self {
        let session = SessionSettings {
            cookie_name: cookie_name.into(),
            max_age_secs: token_config.ttl.num_seconds(),
        };
        Self {
            store,
            tokens: Arc::new(Hs256TokenService::new(token_config)),
            session,
        }
    }

    /// In-memory services (tests, local development).
    pub fn in_memory(token_config: TokenConfig, cookie_name: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), token_config, cookie_name)
    }

    /// Build services from configuration, connecting and migrating Postgres
    /// when persistent stores are enabled.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        let store: SharedStore = match (&config.database_url, config.use_persistent_stores) {
            (Some(url), true) => {
                let pool = db::connect(url, config.db_max_connections).await?;
                db::run_migrations(&pool).await?;
                info!("using postgres store");
                Arc::new(PostgresStore::new(pool))
            }
            _ => {
                info!("using in-memory store");
                Arc::new(InMemoryStore::new())
            }
        };
        Ok(Self::new(store, config.token_config(), config.session_cookie_name.clone()))
    }

    /// `Set-Cookie` value carrying a freshly issued session token.
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.session.cookie_name, token, self.session.max_age_secs
        )
    }
}
