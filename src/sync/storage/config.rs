use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::sync::domain::ROOT;
use crate::sync::storage::api::OffChainUploader;
use crate::sync::storage::dummy::DummyUploader;
use crate::sync::storage::fs::FsUploader;
use crate::sync::storage::memory::{InMemoryUploader, MemoryStore};
use crate::sync::storage::swarm::{SwarmUploader, DEFAULT_TIMEOUT_READ, DEFAULT_TIMEOUT_WRITE};

/// Declarative description of one uploader, as found in the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploaderSpec {
    InMemory {},
    Dummy {},
    Fs {
        root: PathBuf,
        #[serde(default)]
        key_prefix: Option<String>,
    },
    Swarm {
        provider_url: String,
        #[serde(default)]
        timeout_read_ms: Option<u64>,
        #[serde(default)]
        timeout_write_ms: Option<u64>,
    },
}

impl UploaderSpec {
    pub fn build(&self, key: &str, memory: &MemoryStore) -> Result<Arc<dyn OffChainUploader>> {
        let uploader: Arc<dyn OffChainUploader> = match self {
            Self::InMemory {} => Arc::new(InMemoryUploader::new(memory.clone(), key)),
            Self::Dummy {} => Arc::new(DummyUploader),
            Self::Fs { root, key_prefix } => {
                Arc::new(FsUploader::new(root, key_prefix.as_deref())?)
            }
            Self::Swarm {
                provider_url,
                timeout_read_ms,
                timeout_write_ms,
            } => Arc::new(SwarmUploader::new(
                provider_url,
                timeout_read_ms.map_or(DEFAULT_TIMEOUT_READ, Duration::from_millis),
                timeout_write_ms.map_or(DEFAULT_TIMEOUT_WRITE, Duration::from_millis),
            )?),
        };
        Ok(uploader)
    }
}

/// Uploaders per data index document, with a mandatory `root` fallback.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    uploaders: HashMap<String, Arc<dyn OffChainUploader>>,
    root: Arc<dyn OffChainUploader>,
}

impl UploaderConfig {
    pub fn new(mut uploaders: HashMap<String, Arc<dyn OffChainUploader>>) -> Result<Self> {
        let root = uploaders.remove(ROOT).ok_or_else(|| {
            SyncError::Config("No default (`root`) offchain uploader specified!".to_string())
        })?;
        Ok(Self { uploaders, root })
    }

    /// Single uploader for every document.
    pub fn single(root: Arc<dyn OffChainUploader>) -> Self {
        Self {
            uploaders: HashMap::new(),
            root,
        }
    }

    pub fn with_uploader(mut self, key: &str, uploader: Arc<dyn OffChainUploader>) -> Self {
        if key == ROOT {
            self.root = uploader;
        } else {
            self.uploaders.insert(key.to_string(), uploader);
        }
        self
    }

    pub fn from_specs(specs: &BTreeMap<String, UploaderSpec>, memory: &MemoryStore) -> Result<Self> {
        let mut uploaders = HashMap::new();
        for (key, spec) in specs {
            log::debug!("[CONFIG] uploader for {key}: {spec:?}");
            uploaders.insert(key.clone(), spec.build(key, memory)?);
        }
        Self::new(uploaders)
    }

    /// Uploader responsible for `key` (a field name or `root`).
    pub fn get_uploader(&self, key: &str) -> Arc<dyn OffChainUploader> {
        self.uploaders
            .get(key)
            .cloned()
            .unwrap_or_else(|| self.root.clone())
    }
}
