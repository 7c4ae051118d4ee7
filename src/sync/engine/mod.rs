//! Data index decision engine.
//!
//! This module is the **Functional Core** of the synchronization logic. It decides:
//! - which field documents to upload, and where each one would prefer to land,
//! - how uploaded results merge into the published index,
//! - whether the root document and the on-chain pointer need rewriting,
//! - who gets notified and what gets purged.
//!
//! # Architecture guarantees
//! * **No Network**: nothing here talks to a backend or the chain.
//! * **No Async**: all functions are plain and fast.
//! * **Deterministic**: same baseline and record, same decisions.

mod logic;
pub mod types;

#[cfg(test)]
mod tests;

pub use logic::{
    decide_root, merge, needs_pointer_update, notification_targets, plan_fields,
    project_contents, purge_targets,
};
pub use types::{FieldPlan, FieldUpload, PurgeTarget, RootDecision};
