use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Caller-supplied partial record: `fieldName -> payload`.
pub type Record = Map<String, Value>;

/// Contents of a root data index: `<field>Uri -> URI | scalar`.
pub type Contents = Map<String, Value>;

/// The root data index of a hotel as currently published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIndex {
    /// URI of the root document itself.
    #[serde(rename = "ref")]
    pub reference: String,
    pub contents: Contents,
}

impl DataIndex {
    /// URI of the notification service, if the index names one.
    pub fn notifications_uri(&self) -> Option<&str> {
        notifications_uri(&self.contents)
    }
}

pub fn notifications_uri(contents: &Contents) -> Option<&str> {
    contents
        .get("notificationsUri")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Outcome of a successful update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// What was re-published: field names, then `dataIndex` and `onChain` when those were
    /// rewritten.
    pub subjects: Vec<String>,
    /// URI of the root document after the update.
    pub data_index_uri: String,
}

impl UpdateOutcome {
    pub fn root_rewritten(&self) -> bool {
        self.subjects.iter().any(|s| s == "dataIndex")
    }

    pub fn on_chain_written(&self) -> bool {
        self.subjects.iter().any(|s| s == "onChain")
    }
}

/// Per-call options of an update.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateOptions {
    /// Re-upload the root document in place even when the merged contents are unchanged.
    pub force_sync: bool,
}

/// Per-call options of a delete.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    /// Also try to remove the off-chain documents.
    pub purge_off_chain: bool,
}
