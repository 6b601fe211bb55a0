//! Runtime configuration read from the environment (and `.env` when present).
//!
//! - `BIND_ADDR` - Optional. Defaults to `127.0.0.1:3000`.
//! - `DATABASE_URL` - Optional. Defaults to `sqlite://todo.db`.
//! - `DATABASE_MAX_CONNECTIONS` - Optional. Defaults to `10`.
//! - `CORS_ORIGIN` - Optional. Defaults to `http://localhost:3000`.
//! - `TASK_STORE` - Optional. `sqlite` or `memory`. Defaults to `sqlite`.
//! - `CLIENT_ID`, `CLIENT_SECRET`, `USER_POOL_ID`, `USER_POOL_REGION` - Required. Cognito app client.
//! - `FCM_SERVER_KEY`, `FCM_DEVICE_TOKEN` - Optional pair. Without them pushes stay local.
//! - `MOTIVATION_TOPIC` - Optional. Defaults to `motivational_messages`.

use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct CognitoConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_pool_id: String,
    pub region: String,
}

#[derive(Debug, Clone)]
pub struct FcmConfig {
    pub server_key: String,
    pub device_token: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub max_connections: u32,
    pub cors_origin: String,
    pub store: StoreBackend,
    pub cognito: CognitoConfig,
    pub fcm: Option<FcmConfig>,
    pub motivation_topic: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let required =
            |key: &str| lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()));

        let bind_addr = optional("BIND_ADDR", "127.0.0.1:3000");
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue("BIND_ADDR".to_string(), bind_addr.clone()))?;

        let max_connections = optional("DATABASE_MAX_CONNECTIONS", "10");
        let max_connections = max_connections.parse::<u32>().map_err(|_| {
            ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS".to_string(), max_connections.clone())
        })?;

        let store = match optional("TASK_STORE", "sqlite").as_str() {
            "sqlite" => StoreBackend::Sqlite,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::InvalidValue(
                    "TASK_STORE".to_string(),
                    other.to_string(),
                ))
            }
        };

        let cognito = CognitoConfig {
            client_id: required("CLIENT_ID")?,
            client_secret: required("CLIENT_SECRET")?,
            user_pool_id: required("USER_POOL_ID")?,
            region: required("USER_POOL_REGION")?,
        };

        let fcm = match (lookup("FCM_SERVER_KEY"), lookup("FCM_DEVICE_TOKEN")) {
            (Some(server_key), Some(device_token)) => Some(FcmConfig {
                server_key,
                device_token,
            }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::MissingEnvVar("FCM_DEVICE_TOKEN".to_string())),
            (None, Some(_)) => return Err(ConfigError::MissingEnvVar("FCM_SERVER_KEY".to_string())),
        };

        Ok(Config {
            bind_addr,
            database_url: optional("DATABASE_URL", "sqlite://todo.db"),
            max_connections,
            cors_origin: optional("CORS_ORIGIN", "http://localhost:3000"),
            store,
            cognito,
            fcm,
            motivation_topic: optional("MOTIVATION_TOPIC", "motivational_messages"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const COGNITO: [(&str, &str); 4] = [
        ("CLIENT_ID", "client"),
        ("CLIENT_SECRET", "secret"),
        ("USER_POOL_ID", "eu-central-1_pool"),
        ("USER_POOL_REGION", "eu-central-1"),
    ];

    #[test]
    fn defaults_apply_when_only_cognito_is_set() {
        let config = Config::from_lookup(lookup_from(&COGNITO)).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.database_url, "sqlite://todo.db");
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.store, StoreBackend::Sqlite);
        assert_eq!(config.motivation_topic, "motivational_messages");
        assert!(config.fcm.is_none());
    }

    #[test]
    fn missing_cognito_client_is_reported() {
        let err = Config::from_lookup(lookup_from(&COGNITO[1..])).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("CLIENT_ID".to_string()));
    }

    #[test]
    fn half_configured_push_is_rejected() {
        let mut pairs = COGNITO.to_vec();
        pairs.push(("FCM_SERVER_KEY", "key"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(err, ConfigError::MissingEnvVar("FCM_DEVICE_TOKEN".to_string()));
    }

    #[test]
    fn unknown_store_backend_is_invalid() {
        let mut pairs = COGNITO.to_vec();
        pairs.push(("TASK_STORE", "firestore"));
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue("TASK_STORE".to_string(), "firestore".to_string())
        );
    }
}
