//! Off-chain storage adapters.
//!
//! The engine only knows the [`OffChainUploader`] contract; concrete backends are
//! selected per data index document through an [`UploaderConfig`].

pub mod api;
pub mod config;
pub mod download;
pub mod dummy;
pub mod fs;
pub mod memory;
pub mod swarm;


pub use api::{DocumentResolver, OffChainUploader};
pub use config::{UploaderConfig, UploaderSpec};
pub use download::Downloader;
pub use dummy::DummyUploader;
pub use fs::FsUploader;
pub use memory::{InMemoryUploader, MemoryStore};
pub use swarm::SwarmUploader;

/// Short random suffix for generated document names.
pub(crate) fn random_id() -> String {
    hex::encode(rand::random::<[u8; 6]>())
}
