use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where uploaded quotation documents are written and how they are addressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded files are written to
    pub upload_dir: PathBuf,
    /// Prefix of the retrieval URL handed back for each stored file
    pub base_url: String,
    /// Largest accepted upload in bytes
    pub max_upload_bytes: usize,
}

impl StorageConfig {
    /// Expected environment variables:
    /// - UPLOAD_DIR (defaults to ./uploads)
    /// - UPLOAD_BASE_URL (defaults to /files)
    /// - UPLOAD_MAX_BYTES (defaults to 10 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading storage configuration from environment variables");

        let upload_dir = PathBuf::from(env::var("UPLOAD_DIR").unwrap_or_else(|_| {
            warn!("UPLOAD_DIR not set, using default: ./uploads");
            "./uploads".to_string()
        }));
        debug!("Upload directory: {}", upload_dir.display());

        let base_url = env::var("UPLOAD_BASE_URL").unwrap_or_else(|_| "/files".to_string());

        let max_upload_bytes = match env::var("UPLOAD_MAX_BYTES") {
            Ok(value) => value.parse::<usize>().map_err(|_| {
                error!("Invalid UPLOAD_MAX_BYTES value");
                ConfigError::InvalidValue("Invalid UPLOAD_MAX_BYTES value".to_string())
            })?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };
        debug!("Maximum upload size: {} bytes", max_upload_bytes);

        let config = StorageConfig { upload_dir, base_url, max_upload_bytes };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.upload_dir.as_os_str().is_empty() {
            error!("Upload directory is empty");
            return Err(ConfigError::ValidationError("UPLOAD_DIR cannot be empty".to_string()));
        }
        if self.max_upload_bytes == 0 {
            error!("Maximum upload size is 0");
            return Err(ConfigError::ValidationError("UPLOAD_MAX_BYTES must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            upload_dir: PathBuf::from("./uploads"),
            base_url: "/files".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StorageConfig::default();
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.base_url, "/files");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_max_size() {
        let mut config = StorageConfig::default();
        config.max_upload_bytes = 0;
        assert!(config.validate().is_err());
    }
}
