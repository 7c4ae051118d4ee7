//! Structural validators bound to the data index fields.
//!
//! They check the shape the engine relies on (objects where timestamps are stamped,
//! absolute URLs for the inline endpoints). Error paths are rooted at the field name.

use serde_json::Value;
use url::Url;

use crate::error::ValidationError;

pub type Validator = fn(&Value) -> Result<(), ValidationError>;

fn expect_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a serde_json::Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::invalid(path, "Invalid type: expected object"))
}

/// Every member of a collection (object values or array items) must be an object.
fn expect_collection_of_objects(value: &Value, path: &str) -> Result<(), ValidationError> {
    match value {
        Value::Object(map) => {
            for (key, item) in map {
                expect_object(item, &format!("{path}/{key}"))?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                expect_object(item, &format!("{path}/{i}"))?;
            }
            Ok(())
        }
        _ => Err(ValidationError::invalid(
            path,
            "Invalid type: expected object or array",
        )),
    }
}

fn expect_http_url(value: &Value, path: &str) -> Result<(), ValidationError> {
    let raw = value
        .as_str()
        .ok_or_else(|| ValidationError::invalid(path, "Invalid type: expected string"))?;
    let url = Url::parse(raw)
        .map_err(|_| ValidationError::invalid(path, "Format validation failed (uri)"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        _ => Err(ValidationError::invalid(
            path,
            "Format validation failed (uri): expected http or https",
        )),
    }
}

pub fn validate_description(data: &Value) -> Result<(), ValidationError> {
    let description = expect_object(data, "/description")?;
    if let Some(room_types) = description.get("roomTypes") {
        let room_types = expect_object(room_types, "/description/roomTypes")?;
        for (id, room_type) in room_types {
            expect_object(room_type, &format!("/description/roomTypes/{id}"))?;
        }
    }
    Ok(())
}

pub fn validate_rate_plans(data: &Value) -> Result<(), ValidationError> {
    let plans = expect_object(data, "/ratePlans")?;
    for (id, plan) in plans {
        expect_object(plan, &format!("/ratePlans/{id}"))?;
    }
    Ok(())
}

pub fn validate_availability(data: &Value) -> Result<(), ValidationError> {
    let availability = expect_object(data, "/availability")?;
    if let Some(snapshot) = availability.get("latestSnapshot") {
        expect_object(snapshot, "/availability/latestSnapshot")?;
    }
    if let Some(updates) = availability.get("updates") {
        expect_collection_of_objects(updates, "/availability/updates")?;
    }
    Ok(())
}

pub fn validate_notifications(data: &Value) -> Result<(), ValidationError> {
    expect_http_url(data, "/notifications")
}

pub fn validate_booking(data: &Value) -> Result<(), ValidationError> {
    expect_http_url(data, "/booking")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_requires_object_room_types() {
        assert!(validate_description(&json!({"name": "Hotel"})).is_ok());
        let err = validate_description(&json!({"roomTypes": {"single": 3}})).unwrap_err();
        assert_eq!(
            err,
            ValidationError::invalid("/description/roomTypes/single", "Invalid type: expected object")
        );
    }

    #[test]
    fn availability_updates_may_be_array_or_map() {
        assert!(validate_availability(&json!({"updates": [{"day": "2018-01-01"}]})).is_ok());
        assert!(validate_availability(&json!({"updates": {"a": {}}})).is_ok());
        assert!(validate_availability(&json!({"updates": "soon"})).is_err());
    }

    #[test]
    fn endpoints_must_be_http_urls() {
        assert!(validate_notifications(&json!("https://notifications.example")).is_ok());
        assert!(validate_booking(&json!("ftp://booking.example")).is_err());
        assert!(validate_booking(&json!(42)).is_err());
    }
}
