use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const INDEX_FILE: &str = "index.json";

/// One hotel as registered in the local index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelEntry {
    pub manager: String,
    pub data_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub hotels: BTreeMap<String, HotelEntry>,
}

/// JSON snapshot file backing the local index.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the snapshot, or start from an empty one when the file does not exist yet.
    pub fn load_or_create(&self) -> Result<IndexSnapshot> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                let snapshot: IndexSnapshot = serde_json::from_slice(&bytes)?;
                log::info!(
                    "[INDEX] Loaded {} hotels from {}",
                    snapshot.hotels.len(),
                    self.path.display()
                );
                Ok(snapshot)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("[INDEX] Creating new index at {}", self.path.display());
                Ok(IndexSnapshot::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write the snapshot through a temp file, so a crash never leaves a torn index.
    pub fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(snapshot)?)?;
        std::fs::rename(&tmp, &self.path)?;
        log::trace!("[INDEX] Saved {} hotels", snapshot.hotels.len());
        Ok(())
    }
}
