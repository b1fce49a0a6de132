//! API configuration.
//!
//! Loaded from environment variables (optionally seeded from a `.env` file
//! outside production) with fallback to defaults.

use std::net::SocketAddr;

use chrono::Duration;

use stockbridge_auth::TokenConfig;

const DEV_JWT_SECRET: &str = "stockbridge-dev-secret-change-in-production";

/// Runtime configuration for the HTTP server.
#[derive(Clone)]
pub struct AppConfig {
    /// Address the listener binds to.
    pub bind_addr: SocketAddr,

    /// HMAC secret for session tokens.
    pub jwt_secret: String,

    /// Session token lifetime in hours.
    pub token_ttl_hours: i64,

    /// Cookie carrying the session token.
    pub session_cookie_name: String,

    /// Postgres instead of the in-memory store.
    pub use_persistent_stores: bool,

    /// Required when `use_persistent_stores` is set.
    pub database_url: Option<String>,

    pub db_max_connections: u32,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("session_cookie_name", &self.session_cookie_name)
            .field("use_persistent_stores", &self.use_persistent_stores)
            .field("database_url", &self.database_url.as_ref().map(|_| "<redacted>"))
            .field("db_max_connections", &self.db_max_connections)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if std::env::var("ENV").map(|v| v != "production").unwrap_or(true) {
            // A missing .env file is fine.
            let _ = dotenv::dotenv();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut bind_addr: SocketAddr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string()))?;
        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| ConfigError::InvalidValue("PORT".to_string()))?;
            bind_addr.set_port(port);
        }

        let jwt_secret = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let token_ttl_hours: i64 = lookup("TOKEN_TTL_HOURS")
            .unwrap_or_else(|| "72".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("TOKEN_TTL_HOURS".to_string()))?;
        if token_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue("TOKEN_TTL_HOURS".to_string()));
        }

        let use_persistent_stores = match lookup("USE_PERSISTENT_STORES") {
            None => false,
            Some(v) => parse_bool(&v)
                .ok_or_else(|| ConfigError::InvalidValue("USE_PERSISTENT_STORES".to_string()))?,
        };

        let database_url = lookup("DATABASE_URL").filter(|s| !s.is_empty());
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::MissingRequired("DATABASE_URL".to_string()));
        }

        let db_max_connections: u32 = lookup("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?;

        Ok(AppConfig {
            bind_addr,
            jwt_secret,
            token_ttl_hours,
            session_cookie_name: lookup("SESSION_COOKIE_NAME")
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "next-auth.session-token".to_string()),
            use_persistent_stores,
            database_url,
            db_max_connections,
        })
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone().into_bytes(),
            ttl: Duration::hours(self.token_ttl_hours),
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
