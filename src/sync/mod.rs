//! Data index synchronization.
//!
//! A hotel is published as a set of off-chain documents tied together by a root
//! *data index*, whose URI is the only thing stored on chain. [`runtime::Synchronizer`]
//! keeps the three layers consistent on create, update and delete.

pub mod chain;
pub mod domain;
pub mod engine;
pub mod notify;
pub mod runtime;
pub mod storage;
pub mod types;

pub use runtime::Synchronizer;
pub use types::{DataIndex, DeleteOptions, Record, UpdateOptions, UpdateOutcome};
