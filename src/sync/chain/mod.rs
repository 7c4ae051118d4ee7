//! On-chain side: the index gateway contract, its local implementation and wallets.

pub mod api;
pub mod local;
pub mod wallet;

pub use api::{is_valid_address, IndexGateway};
pub use local::LocalIndex;
pub use wallet::{LocalWallet, Wallet, WalletGuard};
