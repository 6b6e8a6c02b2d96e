use serde::{Deserialize, Serialize};
use std::env;
use tracing::error;

use crate::config::ConfigError;

/// Credentials of the administrator account created on first start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUserConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AdminUserConfig {
    /// Reads ADMIN_NAME (defaults to "Administrator"), ADMIN_EMAIL and ADMIN_PASSWORD.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = AdminUserConfig {
            name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".to_string()),
            email: env::var("ADMIN_EMAIL").map_err(|_| ConfigError::EnvVarNotFound("ADMIN_EMAIL".to_string()))?,
            password: env::var("ADMIN_PASSWORD").map_err(|_| ConfigError::EnvVarNotFound("ADMIN_PASSWORD".to_string()))?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.email.contains('@') {
            error!("ADMIN_EMAIL is not a valid email address");
            return Err(ConfigError::ValidationError("ADMIN_EMAIL must be an email address".to_string()));
        }
        if self.password.len() < 8 {
            error!("ADMIN_PASSWORD is too short");
            return Err(ConfigError::ValidationError("ADMIN_PASSWORD must be at least 8 characters long".to_string()));
        }
        Ok(())
    }
}
