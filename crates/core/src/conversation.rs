//! Request, turn, and profile types exchanged with the dialog service.
//!
//! Callers may attach arbitrary extra fields (conversation id, custom
//! attributes); those are carried verbatim through `#[serde(flatten)]`
//! maps so the backend stays forward-compatible with dialog-script changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel input that steers the dialog to the "display sensor value" node.
pub const DISPLAY_SENSOR_VALUE: &str = "DISPLAY SENSOR VALUE";
/// Sentinel input that steers the dialog to the "unknown device" node.
pub const DISPLAY_NO_DEVICE: &str = "DISPLAY NO DEVICE";
/// Degraded reply appended when the device listing cannot be fetched.
pub const BIND_IOT_MESSAGE: &str = "Bind the IoT service to get the list of rooms";
/// Datapoint extracted from telemetry payloads.
pub const SENSOR_FIELD: &str = "temperature";

/// Inbound body of `POST /conversation`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConversationRequest {
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A conversation request merged with the process-fixed dialog identifier,
/// ready to send upstream.
#[derive(Clone, Debug, Serialize)]
pub struct ConversationParams {
    pub dialog_id: String,
    pub input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationParams {
    pub fn new(dialog_id: &str, request: &ConversationRequest) -> Self {
        Self {
            dialog_id: dialog_id.to_string(),
            input: request.input.clone(),
            client_id: request.client_id.clone(),
            extra: request.extra.clone(),
        }
    }

    /// Copy of the params with the free-text input replaced by a sentinel;
    /// every other caller-supplied field is forwarded unchanged.
    pub fn with_input(&self, input: &str) -> Self {
        Self { input: input.to_string(), ..self.clone() }
    }
}

/// One reply from the dialog service.
///
/// Always carries at least one response fragment (upstream contract, not
/// enforced here). Session-state fields ride along in `extra` and must be
/// echoed back on follow-up calls, so a turn is only ever replaced
/// wholesale by a newer one.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConversationTurn {
    pub response: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationTurn {
    /// Joined evaluation string used for intent classification only; the
    /// structured fragments stay untouched.
    pub fn transcript(&self) -> String {
        self.response.join(" ")
    }
}

/// Inbound body of `POST /profile`, merged with the fixed dialog id before
/// the upstream fetch.
#[derive(Clone, Debug, Serialize)]
pub struct ProfileParams {
    pub dialog_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Named session attribute stored by the dialog service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NameValue {
    pub name: String,
    pub value: Value,
}

/// Profile write pushing a computed value back into the dialog session.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Value>,
    pub dialog_id: String,
    pub name_values: Vec<NameValue>,
}

impl ProfileUpdate {
    /// The single `value` attribute carrying a sensor reading.
    pub fn sensor_value(dialog_id: &str, client_id: Option<Value>, value: Value) -> Self {
        Self {
            client_id,
            dialog_id: dialog_id.to_string(),
            name_values: vec![NameValue { name: "value".to_string(), value }],
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{ConversationParams, ConversationRequest, ConversationTurn, ProfileUpdate};

    fn request() -> ConversationRequest {
        serde_json::from_value(json!({
            "input": "where is my device",
            "client_id": 7,
            "conversation_id": 12345,
            "custom": "kept"
        }))
        .expect("request should deserialize")
    }

    #[test]
    fn params_merge_the_dialog_id_and_forward_extras() {
        let params = ConversationParams::new("dlg-1", &request());

        assert_eq!(params.dialog_id, "dlg-1");
        assert_eq!(params.input, "where is my device");
        assert_eq!(params.client_id, Some(json!(7)));
        assert_eq!(params.extra.get("conversation_id"), Some(&json!(12345)));
        assert_eq!(params.extra.get("custom"), Some(&json!("kept")));
    }

    #[test]
    fn with_input_overrides_only_the_input() {
        let params = ConversationParams::new("dlg-1", &request());
        let overridden = params.with_input(super::DISPLAY_NO_DEVICE);

        assert_eq!(overridden.input, super::DISPLAY_NO_DEVICE);
        assert_eq!(overridden.client_id, params.client_id);
        assert_eq!(overridden.extra, params.extra);
    }

    #[test]
    fn turn_transcript_joins_fragments_in_order() {
        let turn: ConversationTurn = serde_json::from_value(json!({
            "response": ["It", "could be here"],
            "conversation_id": 9
        }))
        .expect("turn should deserialize");

        assert_eq!(turn.transcript(), "It could be here");
        assert_eq!(turn.extra.get("conversation_id"), Some(&json!(9)));
    }

    #[test]
    fn sensor_profile_update_carries_a_single_value_pair() {
        let update = ProfileUpdate::sensor_value("dlg-1", Some(json!(7)), json!(42));

        assert_eq!(update.name_values.len(), 1);
        assert_eq!(update.name_values[0].name, "value");
        assert_eq!(update.name_values[0].value, json!(42));
        assert_eq!(
            serde_json::to_value(&update).expect("update should serialize"),
            json!({
                "client_id": 7,
                "dialog_id": "dlg-1",
                "name_values": [{ "name": "value", "value": 42 }]
            })
        );
    }
}
