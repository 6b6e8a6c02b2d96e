use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{error, info, instrument};

use crate::config::StorageConfig;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid object name: {0}")]
    InvalidName(String),
    #[error("Write failed: {0}")]
    WriteFailed(String),
    #[error("Storage task failed: {0}")]
    TaskFailed(String),
}

/// Object store for uploaded documents. Returns the retrieval URL.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn put_object(&self, object_name: &str, content: Bytes, content_type: &str) -> Result<String, StorageError>;
}

/// Writes objects below a local directory and addresses them under a URL prefix.
#[derive(Debug, Clone)]
pub struct LocalFileStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalFileStorage {
    pub fn new(config: &StorageConfig) -> Self {
        LocalFileStorage {
            root: config.upload_dir.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn object_path(&self, object_name: &str) -> Result<PathBuf, StorageError> {
        let valid = !object_name.is_empty()
            && object_name
                .split('/')
                .all(|part| !part.is_empty() && part != "." && part != "..");
        if !valid {
            return Err(StorageError::InvalidName(object_name.to_string()));
        }
        Ok(self.root.join(object_name))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn put_object(&self, object_name: &str, content: Bytes, content_type: &str) -> Result<String, StorageError> {
        let path = self.object_path(object_name)?;

        // The write runs on its own task so a dropped request cannot abort it
        // halfway through.
        let write = tokio::spawn(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &content).await
        });

        match write.await {
            Ok(Ok(())) => {
                info!("Stored object {}", object_name);
                Ok(format!("{}/{}", self.base_url, object_name))
            }
            Ok(Err(e)) => {
                error!("Failed to store object {}: {}", object_name, e);
                Err(StorageError::WriteFailed(e.to_string()))
            }
            Err(e) => {
                error!("Storage task for {} failed: {}", object_name, e);
                Err(StorageError::TaskFailed(e.to_string()))
            }
        }
    }
}
