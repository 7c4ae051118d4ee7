use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{Result, SyncError};
use crate::sync::storage::api::DocumentResolver;
use crate::sync::storage::fs;
use crate::sync::storage::memory::{self, MemoryStore};
use crate::sync::storage::swarm::{self, SwarmUploader};

/// Resolves documents by URL, whatever backend wrote them.
#[derive(Debug, Clone, Default)]
pub struct Downloader {
    memory: Option<MemoryStore>,
    swarm: Option<SwarmUploader>,
    http: Client,
}

impl Downloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory(mut self, store: MemoryStore) -> Self {
        self.memory = Some(store);
        self
    }

    pub fn with_swarm(mut self, swarm: SwarmUploader) -> Self {
        self.swarm = Some(swarm);
        self
    }
}

#[async_trait]
impl DocumentResolver for Downloader {
    async fn download(&self, url: &str) -> Result<Value> {
        log::trace!("[STORAGE] download {url}");
        if url.starts_with(memory::SCHEME) {
            let store = self
                .memory
                .as_ref()
                .ok_or_else(|| SyncError::Config(format!("no memory store to resolve {url}")))?;
            return store.download(url).await;
        }
        if url.starts_with(swarm::SCHEME) {
            let swarm = self
                .swarm
                .as_ref()
                .ok_or_else(|| SyncError::Config(format!("no swarm gateway to resolve {url}")))?;
            return swarm.download(url).await;
        }
        if let Some(path) = fs::decode(url) {
            return fs::read_document(&path).await;
        }
        if url.starts_with("http://") || url.starts_with("https://") {
            let response = self.http.get(url).send().await.map_err(|e| {
                SyncError::UpstreamBadGateway(format!("Invalid response from upstream: {e}"))
            })?;
            let status = response.status();
            if status.is_server_error() {
                return Err(SyncError::UpstreamBadGateway(format!(
                    "Invalid response from upstream: Error {}.",
                    status.as_u16()
                )));
            }
            if !status.is_success() {
                return Err(SyncError::NotFound(format!("no document at {url}")));
            }
            return response.json().await.map_err(|e| {
                SyncError::UpstreamBadGateway(format!("Invalid document from upstream: {e}"))
            });
        }
        Err(SyncError::NotFound(format!("cannot resolve {url}")))
    }
}
