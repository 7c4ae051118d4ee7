//! In-process document storage.
//!
//! A [`MemoryStore`] is shared by every [`InMemoryUploader`] created from it and by the
//! [`Downloader`](super::download::Downloader), so documents written through one can be
//! resolved through the other.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{Result, SyncError};
use crate::sync::storage::api::{check_upload_args, DocumentResolver, OffChainUploader};
use crate::sync::storage::random_id;

pub const SCHEME: &str = "memory://";

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, url: &str, data: &Value) -> Result<()> {
        let bytes = Bytes::from(serde_json::to_vec(data)?);
        self.docs.write().await.insert(url.to_string(), bytes);
        Ok(())
    }

    pub async fn get(&self, url: &str) -> Result<Value> {
        let docs = self.docs.read().await;
        let bytes = docs
            .get(url)
            .ok_or_else(|| SyncError::NotFound(format!("no document at {url}")))?;
        Ok(serde_json::from_slice(bytes)?)
    }

    pub async fn delete(&self, url: &str) -> bool {
        self.docs.write().await.remove(url).is_some()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.docs.read().await.contains_key(url)
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }
}

#[async_trait]
impl DocumentResolver for MemoryStore {
    async fn download(&self, url: &str) -> Result<Value> {
        self.get(url).await
    }
}

/// Uploader writing into a namespace of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct InMemoryUploader {
    store: MemoryStore,
    namespace: String,
}

impl InMemoryUploader {
    pub fn new(store: MemoryStore, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    fn prefix(&self) -> String {
        format!("{SCHEME}{}/", self.namespace)
    }

    /// True for URLs directly inside this uploader's namespace.
    fn in_scope(&self, url: &str) -> bool {
        url.strip_prefix(&self.prefix())
            .is_some_and(|name| !name.is_empty() && !name.contains('/'))
    }
}

#[async_trait]
impl OffChainUploader for InMemoryUploader {
    async fn upload(&self, data: &Value, label: &str, preferred_url: Option<&str>) -> Result<String> {
        check_upload_args(data, label)?;
        let url = match preferred_url {
            Some(url) if self.in_scope(url) => url.to_string(),
            _ => format!("{}{label}_{}.json", self.prefix(), random_id()),
        };
        self.store.put(&url, data).await?;
        log::trace!("[STORAGE] memory upload {label} -> {url}");
        Ok(url)
    }

    async fn remove(&self, url: &str) -> Result<bool> {
        if !self.in_scope(url) {
            return Ok(false);
        }
        self.store.delete(url).await;
        Ok(true)
    }
}
