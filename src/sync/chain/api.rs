use async_trait::async_trait;

use crate::error::Result;
use crate::sync::chain::wallet::WalletGuard;
use crate::sync::types::{DataIndex, Record};

/// Gateway to the on-chain hotel index.
///
/// Writes take an unlocked wallet for signing; the caller owns the guard and releases it
/// when the operation ends.
#[async_trait]
pub trait IndexGateway: Send + Sync {
    /// Address of the index contract, reported in notifications.
    fn index_address(&self) -> &str;

    fn is_valid_address(&self, address: &str) -> bool;

    /// Current root pointer and its projected contents.
    async fn get_data_index(&self, address: &str) -> Result<DataIndex>;

    /// Resolved documents of the given fields (pointer documents downloaded, scalars as-is).
    async fn get_documents(&self, address: &str, fields: &[&str]) -> Result<Record>;

    /// Register a new hotel pointing at `data_uri`; returns its address.
    async fn create_hotel(&self, wallet: &WalletGuard<'_>, data_uri: &str) -> Result<String>;

    async fn update_hotel(&self, wallet: &WalletGuard<'_>, address: &str, data_uri: &str)
        -> Result<()>;

    async fn remove_hotel(&self, wallet: &WalletGuard<'_>, address: &str) -> Result<()>;

    /// Hand management over to `manager`. The hotel address stays the same.
    async fn transfer_hotel(&self, wallet: &WalletGuard<'_>, address: &str, manager: &str)
        -> Result<()>;
}

/// `0x` followed by 40 hex digits, not all zero.
pub fn is_valid_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };
    hex_part.len() == 40
        && hex_part.chars().all(|c| c.is_ascii_hexdigit())
        && hex_part.chars().any(|c| c != '0')
}
