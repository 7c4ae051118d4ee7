#![cfg(test)]
use crate::sync::engine::{
    decide_root, merge, needs_pointer_update, notification_targets, plan_fields,
    project_contents, purge_targets, RootDecision,
};
use crate::sync::types::{Contents, DataIndex, Record};
use serde_json::{json, Value};

// =========================================================================
// Helpers
// =========================================================================

fn map(v: Value) -> Record {
    v.as_object().cloned().unwrap()
}

fn baseline() -> DataIndex {
    DataIndex {
        reference: "mem://root".to_string(),
        contents: map(json!({
            "descriptionUri": "mem://description",
            "ratePlansUri": "mem://rate-plans",
            "notificationsUri": "https://old.example",
        })),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[test]
fn plan_for_create_uploads_pointers_and_inlines_scalars() {
    let record = map(json!({
        "description": {"name": "Hotel"},
        "booking": "https://booking.example",
    }));
    let plan = plan_fields(&record, None);

    assert_eq!(plan.uploads.len(), 1);
    assert_eq!(plan.uploads[0].field.name, "description");
    assert!(plan.uploads[0].preferred_url.is_none());
    assert_eq!(plan.inline["bookingUri"], "https://booking.example");
    assert_eq!(plan.subjects, vec!["description", "booking"]);
}

#[test]
fn plan_for_update_prefers_current_uris() {
    let base = baseline();
    let record = map(json!({"ratePlans": {}, "availability": {}}));
    let plan = plan_fields(&record, Some(&base.contents));

    let preferred: Vec<_> = plan
        .uploads
        .iter()
        .map(|u| (u.field.name, u.preferred_url.clone()))
        .collect();
    assert_eq!(
        preferred,
        vec![
            ("ratePlans", Some("mem://rate-plans".to_string())),
            ("availability", None),
        ]
    );
}

#[test]
fn unchanged_inline_value_is_not_a_subject() {
    let base = baseline();
    let record = map(json!({"notifications": "https://old.example"}));
    let plan = plan_fields(&record, Some(&base.contents));

    assert!(plan.subjects.is_empty());
    assert_eq!(plan.inline.len(), 1);
}

#[test]
fn merge_keeps_untouched_keys() {
    let base = baseline();
    let uploaded = map(json!({"descriptionUri": "mem://description-2"}));
    let merged = merge(&base.contents, &uploaded);

    assert_eq!(merged["descriptionUri"], "mem://description-2");
    assert_eq!(merged["ratePlansUri"], "mem://rate-plans");
    assert_eq!(merged.len(), 3);
}

#[test]
fn deep_equal_contents_write_nothing() {
    let base = baseline();
    let merged = merge(&base.contents, &Contents::new());
    assert_eq!(decide_root(&base, merged, false), RootDecision::Unchanged);
}

#[test]
fn changed_contents_rewrite_root_in_place() {
    let base = baseline();
    let merged = merge(&base.contents, &map(json!({"bookingUri": "https://b.example"})));
    match decide_root(&base, merged, false) {
        RootDecision::Rewrite {
            contents,
            preferred_url,
        } => {
            assert_eq!(preferred_url, "mem://root");
            assert_eq!(contents["bookingUri"], "https://b.example");
        }
        other => panic!("unexpected decision {other:?}"),
    }
}

#[test]
fn force_sync_repairs_without_rewrite() {
    let base = baseline();
    let merged = base.contents.clone();
    assert!(matches!(
        decide_root(&base, merged, true),
        RootDecision::Repair { .. }
    ));
}

#[test]
fn pointer_moves_only_with_new_root_uri() {
    assert!(!needs_pointer_update("mem://root", "mem://root"));
    assert!(needs_pointer_update("mem://root", "mem://root-2"));
}

#[test]
fn notification_targets_union_old_and_new() {
    let old = baseline().contents;
    let mut new = old.clone();
    assert_eq!(notification_targets(&old, &new), vec!["https://old.example"]);

    new.insert("notificationsUri".into(), json!("https://new.example"));
    assert_eq!(
        notification_targets(&old, &new),
        vec!["https://old.example", "https://new.example"]
    );

    assert!(notification_targets(&Contents::new(), &Contents::new()).is_empty());
}

#[test]
fn purge_covers_root_and_pointer_documents() {
    let mut base = baseline();
    base.contents
        .insert("availabilityUri".into(), json!("mem://availability"));
    let targets = purge_targets(&base);

    let urls: Vec<_> = targets.iter().map(|t| (t.uploader, t.url.as_str())).collect();
    assert_eq!(
        urls,
        vec![
            ("root", "mem://root"),
            ("description", "mem://description"),
            ("ratePlans", "mem://rate-plans"),
            ("availability", "mem://availability"),
        ]
    );
}

#[test]
fn projection_drops_unknown_and_empty_keys() {
    let raw = json!({
        "descriptionUri": "mem://d",
        "bookingUri": "",
        "extra": "ignored",
    });
    let contents = project_contents(&raw);
    assert_eq!(contents, map(json!({"descriptionUri": "mem://d"})));
}
