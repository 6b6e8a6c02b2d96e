use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// Which quotation/user store the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Mongo,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(ConfigError::InvalidValue(format!(
                "STORE_BACKEND must be 'mongo' or 'memory', got '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Mongo => write!(f, "mongo"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
}

impl AppConfig {
    /// Expected environment variables:
    /// - APP_HOST (defaults to 127.0.0.1)
    /// - APP_PORT (defaults to 8080)
    /// - STORE_BACKEND: `mongo` or `memory` (defaults to mongo)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading application configuration from environment variables");

        let host = env::var("APP_HOST").unwrap_or_else(|_| {
            warn!("APP_HOST not set, using default: 127.0.0.1");
            "127.0.0.1".to_string()
        });

        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| {
                warn!("APP_PORT not set, using default: 8080");
                "8080".to_string()
            })
            .parse::<u16>()
            .map_err(|_| {
                error!("Invalid APP_PORT value");
                ConfigError::InvalidValue("Invalid APP_PORT value".to_string())
            })?;

        let store_backend = match env::var("STORE_BACKEND") {
            Ok(value) => value.parse::<StoreBackend>()?,
            Err(_) => StoreBackend::default(),
        };
        debug!("Store backend: {}", store_backend);

        let config = AppConfig { host, port, store_backend };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            error!("APP_HOST is empty");
            return Err(ConfigError::ValidationError("APP_HOST cannot be empty".to_string()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            store_backend: StoreBackend::Memory,
        }
    }
}
