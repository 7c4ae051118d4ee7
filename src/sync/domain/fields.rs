//! Field registry: the static declaration of what a hotel record is made of.

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::ValidationError;
use crate::sync::domain::validators::{
    validate_availability, validate_booking, validate_description, validate_notifications,
    validate_rate_plans, Validator,
};
use crate::sync::types::Record;

/// Key under which the root document itself is uploaded and the fallback uploader is
/// registered.
pub const ROOT: &str = "root";

/// Label of the root document.
pub const DATA_INDEX_LABEL: &str = "dataIndex";

const UPDATED_AT: &str = "updatedAt";

/// A logical field of the hotel record.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    /// Key in the root data index.
    pub key: &'static str,
    pub required: bool,
    /// Stored as a separate off-chain document (true) or inline in the index (false).
    pub pointer: bool,
    pub validator: Validator,
}

pub static FIELDS: [FieldSpec; 5] = [
    FieldSpec {
        name: "description",
        key: "descriptionUri",
        required: true,
        pointer: true,
        validator: validate_description,
    },
    FieldSpec {
        name: "ratePlans",
        key: "ratePlansUri",
        required: false,
        pointer: true,
        validator: validate_rate_plans,
    },
    FieldSpec {
        name: "availability",
        key: "availabilityUri",
        required: false,
        pointer: true,
        validator: validate_availability,
    },
    FieldSpec {
        name: "notifications",
        key: "notificationsUri",
        required: false,
        pointer: false,
        validator: validate_notifications,
    },
    FieldSpec {
        name: "booking",
        key: "bookingUri",
        required: false,
        pointer: false,
        validator: validate_booking,
    },
];

pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

pub fn field_names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.name)
}

/// Falsy values (`null`, `false`, `0` and the empty string) count as absent.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() != Some(0.0),
        Some(_) => true,
    }
}

/// Fields that carry a value in `record`, in registry order.
pub fn present_fields(record: &Record) -> impl Iterator<Item = (&'static FieldSpec, &Value)> {
    FIELDS.iter().filter_map(move |f| match record.get(f.name) {
        Some(value) if is_present(Some(value)) => Some((f, value)),
        _ => None,
    })
}

/// Validate a record against the registry.
///
/// `enforce_required` is set on create and on unfiltered reads; partial updates leave
/// required fields optional.
pub fn validate(record: &Record, enforce_required: bool) -> Result<(), ValidationError> {
    for name in record.keys() {
        if field(name).is_none() {
            return Err(ValidationError::UnknownField(name.clone()));
        }
    }
    for f in &FIELDS {
        let value = record.get(f.name);
        if !is_present(value) {
            if enforce_required && f.required {
                return Err(ValidationError::MissingField(f.name.to_string()));
            }
            continue;
        }
        if let Some(value) = value {
            (f.validator)(value)?;
        }
    }
    Ok(())
}

pub fn timestamp_now() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&Rfc3339)
        .unwrap_or_else(|_| now.unix_timestamp().to_string())
}

/// Set `updatedAt` wherever it is missing, using the current time.
pub fn stamp_timestamps(record: &mut Record) {
    let now = timestamp_now();
    stamp_timestamps_at(record, &now);
}

/// Set `updatedAt = at` on every timestamp-bearing object that lacks one:
/// the description, each room type, each rate plan, the latest availability snapshot
/// and each availability update. Existing values are kept.
pub fn stamp_timestamps_at(record: &mut Record, at: &str) {
    if let Some(description) = record.get_mut("description") {
        stamp(description, at);
        stamp_members(description.get_mut("roomTypes"), at);
    }
    stamp_members(record.get_mut("ratePlans"), at);
    if let Some(availability) = record.get_mut("availability") {
        if let Some(snapshot) = availability.get_mut("latestSnapshot") {
            stamp(snapshot, at);
        }
        stamp_members(availability.get_mut("updates"), at);
    }
}

fn stamp(value: &mut Value, at: &str) {
    let Some(obj) = value.as_object_mut() else {
        return;
    };
    let missing = match obj.get(UPDATED_AT) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    };
    if missing {
        obj.insert(UPDATED_AT.to_string(), Value::String(at.to_string()));
    }
}

fn stamp_members(collection: Option<&mut Value>, at: &str) {
    match collection {
        Some(Value::Object(map)) => map.values_mut().for_each(|v| stamp(v, at)),
        Some(Value::Array(items)) => items.iter_mut().for_each(|v| stamp(v, at)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn only_description_is_required() {
        let required: Vec<_> = FIELDS.iter().filter(|f| f.required).map(|f| f.name).collect();
        assert_eq!(required, vec!["description"]);
        assert!(FIELDS.iter().all(|f| f.key == format!("{}Uri", f.name)));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let r = record(json!({"description": {}, "pool": true}));
        assert_eq!(
            validate(&r, false),
            Err(ValidationError::UnknownField("pool".into()))
        );
    }

    #[test]
    fn required_fields_only_enforced_on_request() {
        let r = record(json!({"ratePlans": {}}));
        assert_eq!(
            validate(&r, true),
            Err(ValidationError::MissingField("description".into()))
        );
        assert!(validate(&r, false).is_ok());
    }

    #[test]
    fn null_counts_as_absent() {
        let r = record(json!({"description": null}));
        assert!(validate(&r, true).is_err());
        assert_eq!(present_fields(&r).count(), 0);
    }

    #[test]
    fn falsy_values_are_skipped() {
        let r = record(json!({"description": {}, "booking": false, "notifications": 0}));
        assert!(validate(&r, true).is_ok());
        let present: Vec<_> = present_fields(&r).map(|(f, _)| f.name).collect();
        assert_eq!(present, vec!["description"]);
        assert!(is_present(Some(&json!(true))));
        assert!(is_present(Some(&json!(0.5))));
    }

    #[test]
    fn validator_errors_propagate() {
        let r = record(json!({"description": {}, "notifications": "not a url"}));
        assert!(matches!(
            validate(&r, true),
            Err(ValidationError::Invalid { ref path, .. }) if path == "/notifications"
        ));
    }

    #[test]
    fn timestamps_fill_gaps_only() {
        let mut r = record(json!({
            "description": {
                "roomTypes": {"a": {}, "b": {"updatedAt": "2018-01-01T00:00:00Z"}}
            },
            "ratePlans": {"x": {}},
            "availability": {
                "latestSnapshot": {"updatedAt": null},
                "updates": [{}, {"updatedAt": "2018-02-01T00:00:00Z"}]
            },
            "notifications": "https://notify.example"
        }));
        stamp_timestamps_at(&mut r, "NOW");

        assert_eq!(r["description"]["updatedAt"], "NOW");
        assert_eq!(r["description"]["roomTypes"]["a"]["updatedAt"], "NOW");
        assert_eq!(
            r["description"]["roomTypes"]["b"]["updatedAt"],
            "2018-01-01T00:00:00Z"
        );
        assert_eq!(r["ratePlans"]["x"]["updatedAt"], "NOW");
        assert_eq!(r["availability"]["latestSnapshot"]["updatedAt"], "NOW");
        assert_eq!(r["availability"]["updates"][0]["updatedAt"], "NOW");
        assert_eq!(
            r["availability"]["updates"][1]["updatedAt"],
            "2018-02-01T00:00:00Z"
        );
        assert!(r["availability"].get("updatedAt").is_none());
        assert_eq!(r["notifications"], "https://notify.example");
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let ts = timestamp_now();
        assert!(OffsetDateTime::parse(&ts, &Rfc3339).is_ok());
    }
}
