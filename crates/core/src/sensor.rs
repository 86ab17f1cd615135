//! Decoding of base64-encoded telemetry payloads.
//!
//! Devices publish readings in one of two loosely agreed shapes:
//!
//! ```text
//! { "temperature": 34 }
//! { "d": { "temperature": 43 } }
//! ```
//!
//! The decoder tries the top level first, then one level under the `"d"`
//! wrapper. Every malformed input maps to a [`DecodeError`]; callers treat
//! the error as "no reading available" rather than a failure.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use thiserror::Error;

/// Wrapper key some device firmwares nest their datapoints under.
const WRAPPER_KEY: &str = "d";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is not a JSON object")]
    NotAnObject,
    #[error("field `{0}` not present in payload")]
    MissingField(String),
}

/// Extract a named datapoint from a base64-encoded JSON payload.
///
/// A field that is present but `null` counts as absent, matching the
/// behavior devices rely on when they omit a reading.
pub fn decode_sensor_field(raw_base64: &str, field: &str) -> Result<Value, DecodeError> {
    let decoded = STANDARD.decode(raw_base64.trim())?;
    let payload: Value = serde_json::from_slice(&decoded)?;
    let object = payload.as_object().ok_or(DecodeError::NotAnObject)?;

    if let Some(value) = object.get(field).filter(|value| !value.is_null()) {
        return Ok(value.clone());
    }
    if let Some(nested) = object.get(WRAPPER_KEY).and_then(Value::as_object) {
        if let Some(value) = nested.get(field).filter(|value| !value.is_null()) {
            return Ok(value.clone());
        }
    }

    Err(DecodeError::MissingField(field.to_string()))
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde_json::json;

    use super::{decode_sensor_field, DecodeError};

    fn encode(payload: &str) -> String {
        STANDARD.encode(payload)
    }

    #[test]
    fn reads_field_at_top_level() {
        let raw = encode(r#"{"temperature":42}"#);
        assert_eq!(decode_sensor_field(&raw, "temperature").unwrap(), json!(42));
    }

    #[test]
    fn reads_field_nested_under_wrapper() {
        let raw = encode(r#"{"d":{"temperature":42}}"#);
        assert_eq!(decode_sensor_field(&raw, "temperature").unwrap(), json!(42));
    }

    #[test]
    fn top_level_field_wins_over_nested() {
        let raw = encode(r#"{"temperature":20,"d":{"temperature":30}}"#);
        assert_eq!(decode_sensor_field(&raw, "temperature").unwrap(), json!(20));
    }

    #[test]
    fn null_top_level_field_falls_through_to_wrapper() {
        let raw = encode(r#"{"temperature":null,"d":{"temperature":18}}"#);
        assert_eq!(decode_sensor_field(&raw, "temperature").unwrap(), json!(18));
    }

    #[test]
    fn string_readings_are_preserved() {
        let raw = encode(r#"{"temperature":"21.5"}"#);
        assert_eq!(decode_sensor_field(&raw, "temperature").unwrap(), json!("21.5"));
    }

    #[test]
    fn invalid_base64_is_a_decode_error() {
        let error = decode_sensor_field("!!not base64!!", "temperature").unwrap_err();
        assert!(matches!(error, DecodeError::Base64(_)));
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let error = decode_sensor_field(&encode("not json"), "temperature").unwrap_err();
        assert!(matches!(error, DecodeError::Json(_)));
    }

    #[test]
    fn non_object_payload_is_a_decode_error() {
        let error = decode_sensor_field(&encode("[1,2,3]"), "temperature").unwrap_err();
        assert!(matches!(error, DecodeError::NotAnObject));
    }

    #[test]
    fn missing_field_is_a_decode_error() {
        let error = decode_sensor_field(&encode(r#"{"humidity":55}"#), "temperature").unwrap_err();
        assert!(matches!(error, DecodeError::MissingField(field) if field == "temperature"));
    }
}
