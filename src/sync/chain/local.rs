//! Local stand-in for the on-chain hotel index.
//!
//! Hotels are kept in memory and, when a snapshot file is configured, written through to
//! disk after every signed write. Reads resolve the root document through a
//! [`DocumentResolver`], the way a chain client downloads the data behind a pointer.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{Result, SyncError};
use crate::persistence::{HotelEntry, IndexSnapshot, SnapshotFile};
use crate::sync::chain::api::{is_valid_address, IndexGateway};
use crate::sync::chain::wallet::WalletGuard;
use crate::sync::domain::fields;
use crate::sync::engine::project_contents;
use crate::sync::storage::DocumentResolver;
use crate::sync::types::{DataIndex, Record};

pub struct LocalIndex {
    index_address: String,
    hotels: RwLock<BTreeMap<String, HotelEntry>>,
    resolver: Arc<dyn DocumentResolver>,
    snapshot: Option<SnapshotFile>,
}

impl LocalIndex {
    /// Index living only in memory.
    pub fn new(index_address: impl Into<String>, resolver: Arc<dyn DocumentResolver>) -> Self {
        Self {
            index_address: index_address.into(),
            hotels: RwLock::new(BTreeMap::new()),
            resolver,
            snapshot: None,
        }
    }

    /// Index backed by a snapshot file (load-or-create).
    pub fn open(
        index_address: impl Into<String>,
        resolver: Arc<dyn DocumentResolver>,
        snapshot: SnapshotFile,
    ) -> Result<Self> {
        let loaded = snapshot.load_or_create()?;
        Ok(Self {
            index_address: index_address.into(),
            hotels: RwLock::new(loaded.hotels),
            resolver,
            snapshot: Some(snapshot),
        })
    }

    pub async fn manager_of(&self, address: &str) -> Option<String> {
        self.hotels
            .read()
            .await
            .get(address)
            .map(|h| h.manager.clone())
    }

    async fn entry(&self, address: &str) -> Result<HotelEntry> {
        self.hotels
            .read()
            .await
            .get(address)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(format!("hotel {address} is not in the index")))
    }

    fn persist(&self, hotels: &BTreeMap<String, HotelEntry>) -> Result<()> {
        if let Some(snapshot) = &self.snapshot {
            snapshot.save(&IndexSnapshot {
                hotels: hotels.clone(),
            })?;
        }
        Ok(())
    }

    /// Sign `payload` and check the signer manages `address`.
    fn authorize(
        wallet: &WalletGuard<'_>,
        entry: &HotelEntry,
        address: &str,
        payload: &str,
    ) -> Result<String> {
        if entry.manager != wallet.address() {
            return Err(SyncError::Chain(format!(
                "{} is not the manager of hotel {address}",
                wallet.address()
            )));
        }
        wallet.sign(payload.as_bytes())
    }

    async fn root_document(&self, address: &str) -> Result<(HotelEntry, Value)> {
        let entry = self.entry(address).await?;
        let raw = self.resolver.download(&entry.data_uri).await?;
        Ok((entry, raw))
    }
}

fn new_address(taken: &BTreeMap<String, HotelEntry>) -> String {
    loop {
        let address = format!("0x{}", hex::encode(rand::random::<[u8; 20]>()));
        if is_valid_address(&address) && !taken.contains_key(&address) {
            return address;
        }
    }
}

#[async_trait]
impl IndexGateway for LocalIndex {
    fn index_address(&self) -> &str {
        &self.index_address
    }

    fn is_valid_address(&self, address: &str) -> bool {
        is_valid_address(address)
    }

    async fn get_data_index(&self, address: &str) -> Result<DataIndex> {
        let (entry, raw) = self.root_document(address).await?;
        Ok(DataIndex {
            reference: entry.data_uri,
            contents: project_contents(&raw),
        })
    }

    async fn get_documents(&self, address: &str, names: &[&str]) -> Result<Record> {
        let (_, raw) = self.root_document(address).await?;
        let mut documents = Record::new();
        for name in names {
            let field = fields::field(name)
                .ok_or_else(|| SyncError::BadRequest(format!("Unknown field: {name}")))?;
            let Some(value) = raw.get(field.key).filter(|v| fields::is_present(Some(*v))) else {
                continue;
            };
            let document = match (field.pointer, value.as_str()) {
                (true, Some(url)) => self.resolver.download(url).await?,
                _ => value.clone(),
            };
            documents.insert(field.name.to_string(), document);
        }
        Ok(documents)
    }

    async fn create_hotel(&self, wallet: &WalletGuard<'_>, data_uri: &str) -> Result<String> {
        let mut hotels = self.hotels.write().await;
        let tx = wallet.sign(format!("addHotel:{}:{data_uri}", wallet.address()).as_bytes())?;
        let address = new_address(&hotels);
        hotels.insert(
            address.clone(),
            HotelEntry {
                manager: wallet.address().to_string(),
                data_uri: data_uri.to_string(),
            },
        );
        self.persist(&hotels)?;
        log::info!("[CHAIN] hotel {address} added (tx {tx})");
        Ok(address)
    }

    async fn update_hotel(&self, wallet: &WalletGuard<'_>, address: &str, data_uri: &str) -> Result<()> {
        let mut hotels = self.hotels.write().await;
        let entry = hotels
            .get_mut(address)
            .ok_or_else(|| SyncError::NotFound(format!("hotel {address} is not in the index")))?;
        let tx = Self::authorize(wallet, entry, address, &format!("updateHotel:{address}:{data_uri}"))?;
        entry.data_uri = data_uri.to_string();
        self.persist(&hotels)?;
        log::info!("[CHAIN] hotel {address} now points to {data_uri} (tx {tx})");
        Ok(())
    }

    async fn remove_hotel(&self, wallet: &WalletGuard<'_>, address: &str) -> Result<()> {
        let mut hotels = self.hotels.write().await;
        let entry = hotels
            .get(address)
            .ok_or_else(|| SyncError::NotFound(format!("hotel {address} is not in the index")))?;
        let tx = Self::authorize(wallet, entry, address, &format!("removeHotel:{address}"))?;
        hotels.remove(address);
        self.persist(&hotels)?;
        log::info!("[CHAIN] hotel {address} removed (tx {tx})");
        Ok(())
    }

    async fn transfer_hotel(&self, wallet: &WalletGuard<'_>, address: &str, manager: &str) -> Result<()> {
        let mut hotels = self.hotels.write().await;
        let entry = hotels
            .get_mut(address)
            .ok_or_else(|| SyncError::NotFound(format!("hotel {address} is not in the index")))?;
        let tx = Self::authorize(
            wallet,
            entry,
            address,
            &format!("transferHotelOwnership:{address}:{manager}"),
        )?;
        entry.manager = manager.to_string();
        self.persist(&hotels)?;
        log::info!("[CHAIN] hotel {address} transferred to {manager} (tx {tx})");
        Ok(())
    }
}
