//! Uploader for a local directory, addressed like an object store bucket.
//!
//! Documents land at `<root>/<key_prefix>/<label>_<id>.json` and are referenced by
//! `file://` URLs. A URL is in scope when it decodes to a file directly under the same
//! root and key prefix.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::error::{Result, SyncError};
use crate::sync::storage::api::{check_upload_args, OffChainUploader};
use crate::sync::storage::random_id;

#[derive(Debug, Clone)]
pub struct FsUploader {
    /// `<root>/<key_prefix>`, absolute.
    dir: PathBuf,
}

impl FsUploader {
    pub fn new(root: impl AsRef<Path>, key_prefix: Option<&str>) -> Result<Self> {
        let root = root.as_ref();
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };
        let dir = match key_prefix.filter(|p| !p.is_empty()) {
            Some(prefix) if prefix.ends_with('/') => {
                return Err(SyncError::Config(format!(
                    "Invalid key_prefix - cannot end with '/': {prefix}"
                )));
            }
            Some(prefix) => root.join(prefix),
            None => root,
        };
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn in_scope(&self, path: &Path) -> bool {
        path.parent() == Some(self.dir.as_path()) && path.file_name().is_some()
    }

    fn to_url(path: &Path) -> Result<String> {
        Url::from_file_path(path)
            .map(String::from)
            .map_err(|_| SyncError::Storage(format!("not an absolute path: {}", path.display())))
    }
}

/// Decode a `file://` URL to a local path.
pub fn decode(url: &str) -> Option<PathBuf> {
    let url = Url::parse(url).ok()?;
    if url.scheme() != "file" {
        return None;
    }
    url.to_file_path().ok()
}

pub(crate) fn classify_io(err: std::io::Error, path: &Path) -> SyncError {
    match err.kind() {
        ErrorKind::PermissionDenied => SyncError::UpstreamForbidden(format!(
            "Forbidden by upstream (filesystem): {}: {err}",
            path.display()
        )),
        ErrorKind::NotFound => SyncError::NotFound(format!("no document at {}", path.display())),
        _ => SyncError::Io(err),
    }
}

pub async fn read_document(path: &Path) -> Result<Value> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| classify_io(e, path))?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl OffChainUploader for FsUploader {
    async fn upload(&self, data: &Value, label: &str, preferred_url: Option<&str>) -> Result<String> {
        check_upload_args(data, label)?;
        let path = match preferred_url.and_then(decode) {
            Some(path) if self.in_scope(&path) => path,
            _ => self.dir.join(format!("{label}_{}.json", random_id())),
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| classify_io(e, &self.dir))?;
        let body = serde_json::to_vec(data)?;
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| classify_io(e, &path))?;

        let url = Self::to_url(&path)?;
        log::trace!("[STORAGE] fs upload {label} -> {url}");
        Ok(url)
    }

    async fn remove(&self, url: &str) -> Result<bool> {
        let Some(path) = decode(url).filter(|p| self.in_scope(p)) else {
            return Ok(false);
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(classify_io(e, &path)),
        }
    }
}
