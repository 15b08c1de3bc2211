//! Configuration loading and representation.
//!
//! Everything comes from environment variables; unset variables fall back to
//! development defaults. Set-but-malformed values are errors, never silently
//! replaced.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::warn;

use eventhub_auth::{UserDirectory, UserEntryError};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_SECRET: &str = "dev-secret";
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;
/// One year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_USERS: &str = "user:user:USER;admin:admin:ADMIN,USER";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("EVENTHUB_USERS is invalid: {0}")]
    Users(#[from] UserEntryError),
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl ToString) -> Self {
        Self::Invalid {
            var,
            reason: reason.to_string(),
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    InMemory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub storage: StorageConfig,
    pub users: UserDirectory,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = var("EVENTHUB_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("EVENTHUB_BIND_ADDR", e))?;

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        let ttl_minutes = match var("EVENTHUB_TOKEN_TTL_MINUTES") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|e| ConfigError::invalid("EVENTHUB_TOKEN_TTL_MINUTES", e))?,
            None => DEFAULT_TOKEN_TTL_MINUTES,
        };
        if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&ttl_minutes) {
            return Err(ConfigError::invalid(
                "EVENTHUB_TOKEN_TTL_MINUTES",
                format!("must be between 1 and {MAX_TOKEN_TTL_MINUTES} minutes"),
            ));
        }
        let token_ttl = chrono::Duration::try_minutes(ttl_minutes).ok_or_else(|| {
            ConfigError::invalid("EVENTHUB_TOKEN_TTL_MINUTES", "out of range")
        })?;

        let storage = match var("DATABASE_URL") {
            Some(url) => {
                let max_connections = match var("EVENTHUB_DB_MAX_CONNECTIONS") {
                    Some(raw) => raw
                        .trim()
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| {
                            ConfigError::invalid("EVENTHUB_DB_MAX_CONNECTIONS", "must be a positive integer")
                        })?,
                    None => DEFAULT_DB_MAX_CONNECTIONS,
                };
                StorageConfig::Postgres { url, max_connections }
            }
            None => StorageConfig::InMemory,
        };

        let users = match var("EVENTHUB_USERS") {
            Some(raw) => UserDirectory::parse(&raw)?,
            None => {
                warn!("EVENTHUB_USERS not set; using dev accounts");
                UserDirectory::parse(DEFAULT_USERS)?
            }
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            storage,
            users,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_use_in_memory_storage_and_dev_accounts() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.token_ttl, chrono::Duration::minutes(60));
        assert_eq!(config.storage, StorageConfig::InMemory);
        assert_eq!(config.users.len(), 2);
        assert!(config.users.authenticate("admin", "admin").is_ok());
    }

    #[test]
    fn database_url_selects_postgres() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/eventhub"),
            ("EVENTHUB_DB_MAX_CONNECTIONS", "12"),
        ])
        .unwrap();
        assert_eq!(
            config.storage,
            StorageConfig::Postgres {
                url: "postgres://localhost/eventhub".into(),
                max_connections: 12,
            }
        );
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = load(&[("JWT_SECRET", "  "), ("DATABASE_URL", "")]).unwrap();
        assert_eq!(config.jwt_secret, DEFAULT_JWT_SECRET);
        assert_eq!(config.storage, StorageConfig::InMemory);
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(matches!(
            load(&[("EVENTHUB_BIND_ADDR", "localhost")]),
            Err(ConfigError::Invalid { var: "EVENTHUB_BIND_ADDR", .. })
        ));
        assert!(matches!(
            load(&[("EVENTHUB_TOKEN_TTL_MINUTES", "0")]),
            Err(ConfigError::Invalid { var: "EVENTHUB_TOKEN_TTL_MINUTES", .. })
        ));
        let huge = i64::MAX.to_string();
        assert!(matches!(
            load(&[("EVENTHUB_TOKEN_TTL_MINUTES", huge.as_str())]),
            Err(ConfigError::Invalid { var: "EVENTHUB_TOKEN_TTL_MINUTES", .. })
        ));
        assert!(matches!(
            load(&[("EVENTHUB_TOKEN_TTL_MINUTES", "525601")]),
            Err(ConfigError::Invalid { var: "EVENTHUB_TOKEN_TTL_MINUTES", .. })
        ));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://x"), ("EVENTHUB_DB_MAX_CONNECTIONS", "many")]),
            Err(ConfigError::Invalid { var: "EVENTHUB_DB_MAX_CONNECTIONS", .. })
        ));
        assert!(matches!(
            load(&[("EVENTHUB_USERS", "justaname")]),
            Err(ConfigError::Users(_))
        ));
    }
}
