use std::sync::Arc;

pub mod config;
pub mod error;
pub mod persistence;
pub mod sync;

pub use config::Config;
pub use error::{ErrorBody, Result, SyncError};

use persistence::SnapshotFile;
use sync::chain::LocalIndex;
use sync::notify::HttpNotifier;
use sync::storage::MemoryStore;
use sync::Synchronizer;

/// Synchronizer over the local index, notifying over HTTP.
pub type LocalSynchronizer = Synchronizer<LocalIndex, HttpNotifier>;

pub fn setup_synchronizer(config: &Config) -> Result<LocalSynchronizer> {
    // Shared by in-memory uploaders and the resolver reading their documents back.
    let memory = MemoryStore::new();
    let uploaders = config.uploader_config(&memory)?;
    let resolver = Arc::new(config.downloader(&memory)?);

    let index = LocalIndex::open(
        config.wt_index_address.clone(),
        resolver,
        SnapshotFile::new(config.index_file()),
    )?;
    let notifier = HttpNotifier::new(config.notification_timeout())?;

    Ok(Synchronizer::new(
        uploaders,
        index,
        notifier,
        Arc::new(config.wallet()),
        config.wallet.password.clone(),
    ))
}

#[cfg(test)]
static TEST_COUNTER: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// Fresh directory under the system temp dir.
#[cfg(test)]
pub(crate) fn test_dir(tag: &str) -> std::path::PathBuf {
    use std::sync::atomic::Ordering;

    let count = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let mut dir = std::env::temp_dir();
    dir.push(format!("wt_test_{tag}_{millis}_{count}"));
    std::fs::create_dir_all(&dir).expect("failed to create temp dir");
    dir
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::storage::UploaderSpec;
    use serde_json::json;

    fn local_config(tag: &str) -> Config {
        let data_dir = test_dir(tag);
        let mut config = Config {
            data_dir: data_dir.clone(),
            ..Config::default()
        };
        config.wallet.password = "pw".to_string();
        config.uploaders.insert(
            "root".to_string(),
            UploaderSpec::Fs {
                root: data_dir.join("documents"),
                key_prefix: None,
            },
        );
        config
    }

    #[tokio::test]
    async fn configured_synchronizer_persists_hotels() {
        let config = local_config("setup");
        let address = {
            let sync = setup_synchronizer(&config).unwrap();
            let record = json!({"description": {"name": "Hotel"}});
            sync.create_hotel(record.as_object().cloned().unwrap())
                .await
                .unwrap()
        };

        let sync = setup_synchronizer(&config).unwrap();
        let hotel = sync.get_hotel(&address, &[]).await.unwrap();
        assert_eq!(hotel["description"]["name"], "Hotel");
        assert!(config.index_file().exists());
    }
}
