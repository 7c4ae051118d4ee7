use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::sync::storage::api::{check_upload_args, OffChainUploader};

/// Uploader that stores nothing. Useful for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct DummyUploader;

#[async_trait]
impl OffChainUploader for DummyUploader {
    async fn upload(&self, data: &Value, label: &str, _preferred_url: Option<&str>) -> Result<String> {
        check_upload_args(data, label)?;
        Ok(format!("dummy://{label}.json"))
    }

    async fn remove(&self, _url: &str) -> Result<bool> {
        Ok(false)
    }
}
