use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use tracing::{debug, error, info};

use crate::config::ConfigError;

/// Connection settings and collection names for the MongoDB store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub quotation_collection: String,
    pub user_collection: String,
    pub pool_size: u32,
    pub connection_timeout_secs: u64,
}

fn required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| {
        error!("{} environment variable not found", key);
        ConfigError::EnvVarNotFound(key.to_string())
    })
}

fn parsed_or<T: FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value.parse::<T>().map_err(|_| {
            error!("Invalid {} value", key);
            ConfigError::InvalidValue(format!("Invalid {} value", key))
        }),
        Err(_) => Ok(default),
    }
}

impl MongoConfig {
    /// Reads MONGO_URI and MONGO_DATABASE (required), MONGO_USERNAME and
    /// MONGO_PASSWORD, MONGO_QUOTATION_COLLECTION (`quotations`),
    /// MONGO_USER_COLLECTION (`users`), MONGO_POOL_SIZE (10) and
    /// MONGO_CONNECTION_TIMEOUT in seconds (5).
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading MongoDB configuration from environment variables");
        let defaults = MongoConfig::default();

        let config = MongoConfig {
            uri: required("MONGO_URI")?,
            database: required("MONGO_DATABASE")?,
            username: env::var("MONGO_USERNAME").ok(),
            password: env::var("MONGO_PASSWORD").ok(),
            quotation_collection: env::var("MONGO_QUOTATION_COLLECTION").unwrap_or(defaults.quotation_collection),
            user_collection: env::var("MONGO_USER_COLLECTION").unwrap_or(defaults.user_collection),
            pool_size: parsed_or("MONGO_POOL_SIZE", defaults.pool_size)?,
            connection_timeout_secs: parsed_or("MONGO_CONNECTION_TIMEOUT", defaults.connection_timeout_secs)?,
        };
        // The URI may embed credentials, so only the database is logged.
        debug!(
            database = %config.database,
            pool_size = config.pool_size,
            authenticated = config.username.is_some(),
            "MongoDB settings read"
        );

        config.validate()?;
        info!("MongoDB configuration loaded successfully");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let problem = if self.uri.is_empty() {
            Some("MongoDB URI cannot be empty")
        } else if self.database.is_empty() {
            Some("MongoDB database cannot be empty")
        } else if self.quotation_collection.is_empty() || self.user_collection.is_empty() {
            Some("MongoDB collection names cannot be empty")
        } else if self.pool_size == 0 {
            Some("MongoDB pool size must be greater than 0")
        } else if self.connection_timeout_secs == 0 {
            Some("MongoDB connection timeout must be greater than 0")
        } else if self.username.as_deref() == Some("") || self.password.as_deref() == Some("") {
            Some("MongoDB credentials cannot be empty if set")
        } else {
            None
        };

        match problem {
            Some(message) => {
                error!("{}", message);
                Err(ConfigError::ValidationError(message.to_string()))
            }
            None => Ok(()),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "quotation_tracker".to_string(),
            username: None,
            password: None,
            quotation_collection: "quotations".to_string(),
            user_collection: "users".to_string(),
            pool_size: 10,
            connection_timeout_secs: 5,
        }
    }
}
