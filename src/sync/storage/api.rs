use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Result, SyncError};

/// Off-chain storage backend used for one or more data index documents.
#[async_trait]
pub trait OffChainUploader: Send + Sync + std::fmt::Debug {
    /// Store `data` and return its URI.
    ///
    /// `label` makes generated URLs human-friendly where the backend can. When
    /// `preferred_url` falls within the backend's own addressing scope it should be reused,
    /// so the pointers referencing it stay valid.
    async fn upload(&self, data: &Value, label: &str, preferred_url: Option<&str>)
        -> Result<String>;

    /// Remove the document at `url`.
    ///
    /// Returns `false` when the backend cannot tell whether it owns the URL.
    async fn remove(&self, url: &str) -> Result<bool>;
}

/// Reads a document back by its URI.
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    async fn download(&self, url: &str) -> Result<Value>;
}

/// Preconditions shared by every backend.
pub fn check_upload_args(data: &Value, label: &str) -> Result<()> {
    if data.is_null() {
        return Err(SyncError::Storage(
            "Please provide the data to be uploaded.".to_string(),
        ));
    }
    if label.is_empty() {
        return Err(SyncError::Storage(
            "Please provide a label for the data.".to_string(),
        ));
    }
    Ok(())
}
