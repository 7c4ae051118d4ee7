use serde_json::Value;

use crate::sync::domain::fields::{self, is_present, FIELDS, ROOT};
use crate::sync::engine::types::{FieldPlan, FieldUpload, PurgeTarget, RootDecision};
use crate::sync::types::{notifications_uri, Contents, DataIndex, Record};

/// Split a validated record into pointer uploads and inline values.
///
/// With a `baseline` (update), pointer uploads prefer the currently published URI and
/// inline values only become subjects when they differ from the published ones.
pub fn plan_fields(record: &Record, baseline: Option<&Contents>) -> FieldPlan {
    let mut plan = FieldPlan::default();

    for (field, value) in fields::present_fields(record) {
        let current = baseline.and_then(|c| c.get(field.key));

        if field.pointer {
            log::debug!(
                "[ENGINE] upload {} (preferred: {:?})",
                field.name,
                current.and_then(Value::as_str)
            );
            plan.uploads.push(FieldUpload {
                field,
                data: value.clone(),
                preferred_url: current.and_then(Value::as_str).map(str::to_string),
            });
            plan.subjects.push(field.name.to_string());
        } else {
            if current != Some(value) {
                plan.subjects.push(field.name.to_string());
            }
            plan.inline.insert(field.key.to_string(), value.clone());
        }
    }

    plan
}

/// Uploaded and inline keys win; untouched keys of `orig` are retained.
pub fn merge(orig: &Contents, uploaded: &Contents) -> Contents {
    let mut merged = orig.clone();
    for (key, value) in uploaded {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Decide whether the merged contents require a new root document.
pub fn decide_root(baseline: &DataIndex, merged: Contents, force_sync: bool) -> RootDecision {
    if merged != baseline.contents {
        log::debug!("[ENGINE] data index changed, root document will be rewritten");
        return RootDecision::Rewrite {
            contents: merged,
            preferred_url: baseline.reference.clone(),
        };
    }
    if force_sync {
        log::debug!("[ENGINE] data index unchanged, forced in-place re-upload");
        return RootDecision::Repair {
            contents: merged,
            preferred_url: baseline.reference.clone(),
        };
    }
    log::debug!("[ENGINE] data index unchanged");
    RootDecision::Unchanged
}

/// The on-chain pointer only moves when the root document landed at a new URI.
pub fn needs_pointer_update(orig_ref: &str, new_ref: &str) -> bool {
    orig_ref != new_ref
}

/// Notification services to inform about an update: the old and the new one, once each.
pub fn notification_targets(old: &Contents, new: &Contents) -> Vec<String> {
    let mut targets: Vec<String> = Vec::new();
    for uri in [notifications_uri(old), notifications_uri(new)]
        .into_iter()
        .flatten()
    {
        if !targets.iter().any(|t| t == uri) {
            targets.push(uri.to_string());
        }
    }
    targets
}

/// Documents owned by a hotel: the root document and every pointer field with a URI.
pub fn purge_targets(index: &DataIndex) -> Vec<PurgeTarget> {
    let mut targets = vec![PurgeTarget {
        uploader: ROOT,
        url: index.reference.clone(),
    }];
    for field in FIELDS.iter().filter(|f| f.pointer) {
        if let Some(url) = index.contents.get(field.key).and_then(Value::as_str) {
            if !url.is_empty() {
                targets.push(PurgeTarget {
                    uploader: field.name,
                    url: url.to_string(),
                });
            }
        }
    }
    targets
}

/// Project a downloaded root document onto the registry keys.
pub fn project_contents(raw: &Value) -> Contents {
    let mut contents = Contents::new();
    for field in &FIELDS {
        let value = raw.get(field.key);
        if is_present(value) {
            if let Some(value) = value {
                contents.insert(field.key.to_string(), value.clone());
            }
        }
    }
    contents
}
