//! File configuration for the synchronizer binary.
//!
//! ```toml
//! wt_index_address = "0x..."
//! data_dir = "./wt-data"
//!
//! [wallet]
//! address = "0x..."
//! password = "..."
//! secret = "..."
//!
//! [uploaders.root]
//! fs = { root = "./wt-data/documents" }
//!
//! [uploaders.availability]
//! swarm = { provider_url = "http://localhost:8500" }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::persistence::INDEX_FILE;
use crate::sync::chain::LocalWallet;
use crate::sync::domain::ROOT;
use crate::sync::storage::swarm::{DEFAULT_TIMEOUT_READ, DEFAULT_TIMEOUT_WRITE};
use crate::sync::storage::{
    Downloader, MemoryStore, SwarmUploader, UploaderConfig, UploaderSpec,
};

pub const DEFAULT_DATA_DIR: &str = "./wt-data";
pub const DEFAULT_NOTIFICATION_TIMEOUT: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    pub address: String,
    pub password: String,
    pub secret: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            address: "0x0000000000000000000000000000000000000001".to_string(),
            password: String::new(),
            secret: "local-development".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub wt_index_address: String,
    pub data_dir: PathBuf,
    pub notification_timeout_ms: Option<u64>,
    pub wallet: WalletConfig,
    pub uploaders: BTreeMap<String, UploaderSpec>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        let uploaders = BTreeMap::from([(
            ROOT.to_string(),
            UploaderSpec::Fs {
                root: data_dir.join("documents"),
                key_prefix: None,
            },
        )]);
        Self {
            wt_index_address: "0x0000000000000000000000000000000000000002".to_string(),
            data_dir,
            notification_timeout_ms: None,
            wallet: WalletConfig::default(),
            uploaders,
        }
    }
}

impl Config {
    /// Read a TOML file and apply environment overrides.
    ///
    /// The local index outlives the process, so documents must too: `in_memory`
    /// uploaders are rejected here and only usable when wiring a [`Config`] in-process.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config = Self::parse(&raw)?;
        config.check_persistent()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        log::info!("[CONFIG] Loaded {}", path.display());
        Ok(config)
    }

    /// Defaults with environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn parse(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| SyncError::Config(e.to_string()))
    }

    /// Every uploader must write documents a later process can read back.
    pub fn check_persistent(&self) -> Result<()> {
        match self
            .uploaders
            .iter()
            .find(|(_, spec)| matches!(spec, UploaderSpec::InMemory {}))
        {
            Some((key, _)) => Err(SyncError::Config(format!(
                "uploader `{key}`: in_memory documents do not survive the process, use fs or swarm"
            ))),
            None => Ok(()),
        }
    }

    /// Apply `WT_*` and `ADAPTER_SWARM_*` overrides looked up through `lookup`.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(address) = lookup("WT_INDEX_ADDRESS") {
            self.wt_index_address = address;
        }
        if let Some(password) = lookup("WT_WALLET_PASSWORD") {
            self.wallet.password = password;
        }

        let gateway = lookup("ADAPTER_SWARM_GATEWAY");
        let read = parse_millis(&lookup, "ADAPTER_SWARM_READ_TIMEOUT")?;
        let write = parse_millis(&lookup, "ADAPTER_SWARM_WRITE_TIMEOUT")?;
        for spec in self.uploaders.values_mut() {
            if let UploaderSpec::Swarm {
                provider_url,
                timeout_read_ms,
                timeout_write_ms,
            } = spec
            {
                if let Some(gateway) = &gateway {
                    *provider_url = gateway.clone();
                }
                if read.is_some() {
                    *timeout_read_ms = read;
                }
                if write.is_some() {
                    *timeout_write_ms = write;
                }
            }
        }
        Ok(())
    }

    pub fn index_file(&self) -> PathBuf {
        self.data_dir.join(INDEX_FILE)
    }

    pub fn notification_timeout(&self) -> Duration {
        self.notification_timeout_ms
            .map_or(DEFAULT_NOTIFICATION_TIMEOUT, Duration::from_millis)
    }

    pub fn uploader_config(&self, memory: &MemoryStore) -> Result<UploaderConfig> {
        UploaderConfig::from_specs(&self.uploaders, memory)
    }

    /// Resolver able to read back whatever the configured uploaders write.
    pub fn downloader(&self, memory: &MemoryStore) -> Result<Downloader> {
        let mut downloader = Downloader::new().with_memory(memory.clone());
        let swarm = self.uploaders.values().find_map(|spec| match spec {
            UploaderSpec::Swarm {
                provider_url,
                timeout_read_ms,
                timeout_write_ms,
            } => Some((provider_url, *timeout_read_ms, *timeout_write_ms)),
            _ => None,
        });
        if let Some((provider_url, read, write)) = swarm {
            let swarm = SwarmUploader::new(
                provider_url,
                read.map_or(DEFAULT_TIMEOUT_READ, Duration::from_millis),
                write.map_or(DEFAULT_TIMEOUT_WRITE, Duration::from_millis),
            )?;
            downloader = downloader.with_swarm(swarm);
        }
        Ok(downloader)
    }

    pub fn wallet(&self) -> LocalWallet {
        LocalWallet::new(
            self.wallet.address.clone(),
            &self.wallet.password,
            self.wallet.secret.as_bytes().to_vec(),
        )
    }
}

fn parse_millis<F>(lookup: &F, key: &str) -> Result<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|_| SyncError::Config(format!("{key} must be a number of milliseconds")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SAMPLE: &str = r#"
        wt_index_address = "0x00000000000000000000000000000000000000f1"
        data_dir = "/var/lib/wt"

        [wallet]
        address = "0x00000000000000000000000000000000000000aa"
        password = "file-password"
        secret = "s3cr3t"

        [uploaders.root]
        in_memory = {}

        [uploaders.availability]
        swarm = { provider_url = "http://localhost:8500", timeout_read_ms = 300 }

        [uploaders.ratePlans]
        fs = { root = "/var/lib/wt/plans", key_prefix = "hotels" }
    "#;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn parses_uploader_table() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.index_file(), PathBuf::from("/var/lib/wt/index.json"));
        assert_eq!(config.uploaders.len(), 3);
        assert_eq!(config.uploaders["root"], UploaderSpec::InMemory {});
        assert_eq!(
            config.uploaders["availability"],
            UploaderSpec::Swarm {
                provider_url: "http://localhost:8500".to_string(),
                timeout_read_ms: Some(300),
                timeout_write_ms: None,
            }
        );
        assert_eq!(
            config.uploaders["ratePlans"],
            UploaderSpec::Fs {
                root: PathBuf::from("/var/lib/wt/plans"),
                key_prefix: Some("hotels".to_string()),
            }
        );
        assert_eq!(config.notification_timeout(), DEFAULT_NOTIFICATION_TIMEOUT);
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = Config::parse(SAMPLE).unwrap();
        config
            .apply_overrides(env(&[
                ("WT_INDEX_ADDRESS", "0x00000000000000000000000000000000000000f2"),
                ("WT_WALLET_PASSWORD", "env-password"),
                ("ADAPTER_SWARM_GATEWAY", "http://swarm.example"),
                ("ADAPTER_SWARM_WRITE_TIMEOUT", "4000"),
            ]))
            .unwrap();

        assert_eq!(config.wt_index_address, "0x00000000000000000000000000000000000000f2");
        assert_eq!(config.wallet.password, "env-password");
        assert_eq!(
            config.uploaders["availability"],
            UploaderSpec::Swarm {
                provider_url: "http://swarm.example".to_string(),
                timeout_read_ms: Some(300),
                timeout_write_ms: Some(4000),
            }
        );
    }

    #[test]
    fn malformed_timeout_is_config_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(env(&[("ADAPTER_SWARM_READ_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn root_uploader_is_mandatory() {
        let config = Config::parse(
            r#"
            [uploaders.description]
            dummy = {}
            "#,
        )
        .unwrap();
        let err = config.uploader_config(&MemoryStore::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "configuration error: No default (`root`) offchain uploader specified!"
        );
    }

    #[test]
    fn key_prefix_with_trailing_slash_is_rejected() {
        let config = Config::parse(
            r#"
            [uploaders.root]
            fs = { root = "/tmp/wt", key_prefix = "hotels/" }
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.uploader_config(&MemoryStore::new()),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn load_rejects_in_memory_uploaders() {
        let path = crate::test_dir("config_in_memory").join("wt.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(
            matches!(err, SyncError::Config(ref m) if m.contains("uploader `root`")),
            "{err}"
        );

        let persistent = SAMPLE.replace("in_memory = {}", "fs = { root = \"/var/lib/wt/docs\" }");
        std::fs::write(&path, persistent).unwrap();
        let config = Config::load(&path).unwrap();
        assert!(config.check_persistent().is_ok());
    }

    #[test]
    fn default_is_local_filesystem() {
        let config = Config::default();
        assert_eq!(config.index_file(), PathBuf::from("./wt-data/index.json"));
        assert!(matches!(config.uploaders[ROOT], UploaderSpec::Fs { .. }));
        assert!(config.downloader(&MemoryStore::new()).is_ok());
    }
}
