use serde_json::Value;

use crate::sync::domain::FieldSpec;
use crate::sync::types::Contents;

/// A pointer field document that has to be uploaded.
#[derive(Debug, Clone)]
pub struct FieldUpload {
    pub field: &'static FieldSpec,
    pub data: Value,
    /// Current URI of the document, so the backend can overwrite it in place.
    pub preferred_url: Option<String>,
}

/// What a create/update call has to publish for its record.
#[derive(Debug, Clone, Default)]
pub struct FieldPlan {
    /// Pointer field documents, uploaded concurrently.
    pub uploads: Vec<FieldUpload>,
    /// Inline scalars, written into the index as-is.
    pub inline: Contents,
    /// Field names (`ratePlans`, not `ratePlansUri`) that are (re)published by this call;
    /// they become the `subjects` of the update notification.
    pub subjects: Vec<String>,
}

/// Whether the root document has to be written after the merge.
#[derive(Debug, Clone, PartialEq)]
pub enum RootDecision {
    /// Merged contents equal the baseline: no further writes.
    Unchanged,
    /// Contents changed: upload the merged index, then check the on-chain pointer.
    Rewrite {
        contents: Contents,
        preferred_url: String,
    },
    /// Contents unchanged but a forced sync was requested: re-upload in place only.
    Repair {
        contents: Contents,
        preferred_url: String,
    },
}

/// An off-chain document to remove on purge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeTarget {
    /// Registry key of the uploader responsible for the document (`root` or a field name).
    pub uploader: &'static str,
    pub url: String,
}
