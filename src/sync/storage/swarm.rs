//! Uploader for an Ethereum Swarm HTTP gateway.
//!
//! Swarm is content addressed: the same document always yields the same
//! `bzz-raw://<hash>` URL, so preferred URLs are never reused and nothing can be removed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{Result, SyncError};
use crate::sync::storage::api::{check_upload_args, DocumentResolver, OffChainUploader};

pub const SCHEME: &str = "bzz-raw://";

pub const DEFAULT_TIMEOUT_READ: Duration = Duration::from_millis(1000);
pub const DEFAULT_TIMEOUT_WRITE: Duration = Duration::from_millis(2500);

#[derive(Debug, Clone)]
pub struct SwarmUploader {
    provider: String,
    reader: Client,
    writer: Client,
}

impl SwarmUploader {
    pub fn new(provider_url: &str, timeout_read: Duration, timeout_write: Duration) -> Result<Self> {
        if provider_url.is_empty() {
            return Err(SyncError::Config(
                "Missing required option: provider_url".to_string(),
            ));
        }
        let build = |timeout| {
            Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| SyncError::Config(format!("cannot build swarm client: {e}")))
        };
        Ok(Self {
            provider: provider_url.trim_end_matches('/').to_string(),
            reader: build(timeout_read)?,
            writer: build(timeout_write)?,
        })
    }

    fn endpoint(&self, hash: &str) -> String {
        format!("{}/bzz-raw:/{hash}", self.provider)
    }
}

fn classify_request(err: reqwest::Error) -> SyncError {
    if err.is_connect() || err.is_timeout() {
        return SyncError::UpstreamBadGateway(format!(
            "Invalid response from upstream (Swarm): {err}"
        ));
    }
    SyncError::Storage(format!("swarm request failed: {err}"))
}

fn classify_status(status: StatusCode) -> Option<SyncError> {
    if status == StatusCode::FORBIDDEN {
        return Some(SyncError::UpstreamForbidden(
            "Forbidden by upstream (Swarm)".to_string(),
        ));
    }
    if status.is_server_error() {
        return Some(SyncError::UpstreamBadGateway(format!(
            "Invalid response from upstream (Swarm): Error {}.",
            status.as_u16()
        )));
    }
    if status == StatusCode::NOT_FOUND {
        return Some(SyncError::NotFound("document not found in Swarm".to_string()));
    }
    if !status.is_success() {
        return Some(SyncError::Storage(format!(
            "unexpected swarm response: Error {}.",
            status.as_u16()
        )));
    }
    None
}

#[async_trait]
impl OffChainUploader for SwarmUploader {
    async fn upload(&self, data: &Value, label: &str, _preferred_url: Option<&str>) -> Result<String> {
        check_upload_args(data, label)?;
        let response = self
            .writer
            .post(self.endpoint(""))
            .json(data)
            .send()
            .await
            .map_err(classify_request)?;
        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }
        let hash = response.text().await.map_err(classify_request)?;
        let hash = hash.trim();
        if hash.is_empty() {
            return Err(SyncError::UpstreamBadGateway(
                "Invalid response from upstream (Swarm): empty hash".to_string(),
            ));
        }
        log::trace!("[STORAGE] swarm upload {label} -> {hash}");
        Ok(format!("{SCHEME}{hash}"))
    }

    async fn remove(&self, _url: &str) -> Result<bool> {
        Ok(false)
    }
}

#[async_trait]
impl DocumentResolver for SwarmUploader {
    async fn download(&self, url: &str) -> Result<Value> {
        let hash = url
            .strip_prefix(SCHEME)
            .ok_or_else(|| SyncError::Storage(format!("not a swarm url: {url}")))?;
        let response = self
            .reader
            .get(self.endpoint(hash))
            .send()
            .await
            .map_err(classify_request)?;
        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }
        response.json().await.map_err(|e| {
            SyncError::UpstreamBadGateway(format!("Invalid document from upstream (Swarm): {e}"))
        })
    }
}
