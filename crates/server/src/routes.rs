//! Conversation and profile endpoints.
//!
//! - `POST /conversation` — advance the dialog one turn, classify the reply,
//!   and enrich it with live device data when the dialog asks for it.
//! - `POST /profile`      — fetch the stored session profile verbatim.
//!
//! Each request is one strictly ordered chain of dependent remote calls;
//! there is no fan-out. The only shared mutable state is the device
//! directory snapshot, swapped wholesale after a successful listing.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use roomsense_clients::{ConversationClient, ConversationError, DirectoryClient};
use roomsense_core::{
    classify, decode_sensor_field, ComfortRange, ConversationParams, ConversationRequest,
    ConversationTurn, DeviceDirectory, Intent, ProfileParams, ProfileUpdate, BIND_IOT_MESSAGE,
    DISPLAY_NO_DEVICE, DISPLAY_SENSOR_VALUE, SENSOR_FIELD,
};

/// Reading reported when no telemetry is available for a device: the
/// dialog script renders this sentinel as "no value" wording.
const NO_READING: &str = "NO";

#[derive(Clone)]
pub struct AppState {
    pub dialog_id: String,
    pub dialog: Arc<dyn ConversationClient>,
    pub directory: Arc<dyn DirectoryClient>,
    pub devices: Arc<RwLock<Arc<DeviceDirectory>>>,
    pub comfort: Option<ComfortRange>,
}

impl AppState {
    pub fn new(
        dialog_id: String,
        dialog: Arc<dyn ConversationClient>,
        directory: Arc<dyn DirectoryClient>,
        comfort: Option<ComfortRange>,
    ) -> Self {
        Self {
            dialog_id,
            dialog,
            directory,
            devices: Arc::new(RwLock::new(Arc::new(DeviceDirectory::default()))),
            comfort,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConversationEnvelope {
    pub dialog_id: String,
    pub conversation: ConversationTurn,
}

#[derive(Debug, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub client_id: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/conversation", post(conversation))
        .route("/profile", post(profile))
        .with_state(state)
}

fn dialog_error(error: ConversationError) -> ApiError {
    error!(event_name = "conversation.dialog_failed", error = %error, "dialog service call failed");
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorBody { error: "dialog service request failed".to_string() }),
    )
}

fn envelope(dialog_id: &str, conversation: ConversationTurn) -> Json<ConversationEnvelope> {
    Json(ConversationEnvelope { dialog_id: dialog_id.to_string(), conversation })
}

/// Advance the conversation and resolve any device intent in the reply.
pub async fn conversation(
    State(state): State<AppState>,
    Json(request): Json<ConversationRequest>,
) -> Result<Json<ConversationEnvelope>, ApiError> {
    let params = ConversationParams::new(&state.dialog_id, &request);
    let turn = state.dialog.converse(&params).await.map_err(dialog_error)?;
    let transcript = turn.transcript();

    match classify(&transcript) {
        Intent::DeviceList => resolve_device_list(&state, turn, transcript).await,
        Intent::DeviceValue => resolve_device_value(&state, &request, &params, &transcript).await,
        Intent::None => Ok(envelope(&state.dialog_id, turn)),
    }
}

/// The dialog offered a choice of offices: rebuild the directory snapshot
/// and replace the reply fragments with the transcript plus the display keys.
async fn resolve_device_list(
    state: &AppState,
    mut turn: ConversationTurn,
    transcript: String,
) -> Result<Json<ConversationEnvelope>, ApiError> {
    match state.directory.list_devices().await {
        Ok(records) => {
            let rebuilt = DeviceDirectory::from_records(records);
            let mut response = Vec::with_capacity(rebuilt.len() + 1);
            response.push(transcript);
            response.extend(rebuilt.keys().map(str::to_string));

            info!(
                event_name = "conversation.directory_rebuilt",
                devices = rebuilt.len(),
                "device directory rebuilt from fresh listing"
            );
            *state.devices.write().await = Arc::new(rebuilt);
            turn.response = response;
        }
        Err(error) => {
            // Directory stays untouched; the caller gets a degraded reply.
            warn!(
                event_name = "conversation.directory_unavailable",
                error = %error,
                "device listing failed; returning degraded reply"
            );
            turn.response.push(String::new());
            turn.response.push(BIND_IOT_MESSAGE.to_string());
        }
    }

    Ok(envelope(&state.dialog_id, turn))
}

/// The dialog asked for a sensor reading: look the device up by the first
/// comma-separated token of the transcript, push the decoded reading into
/// the session profile, and re-converse so the dialog can render it.
async fn resolve_device_value(
    state: &AppState,
    request: &ConversationRequest,
    params: &ConversationParams,
    transcript: &str,
) -> Result<Json<ConversationEnvelope>, ApiError> {
    let key = transcript.split(',').next().unwrap_or_default();
    let selected = { state.devices.read().await.get(key).cloned() };

    let Some(device) = selected else {
        info!(
            event_name = "conversation.device_unknown",
            key,
            "no device under lookup key; steering dialog to the no-device node"
        );
        let turn =
            state.dialog.converse(&params.with_input(DISPLAY_NO_DEVICE)).await.map_err(dialog_error)?;
        return Ok(envelope(&state.dialog_id, turn));
    };

    // Absent events, undecodable payloads, and a failed lookup all report
    // the NO sentinel; only dialog-service failures abort the request.
    let reading = match state.directory.last_events(&device.type_id, &device.device_id).await {
        Ok(events) => match events.first() {
            Some(event) => decode_sensor_field(&event.payload, SENSOR_FIELD).unwrap_or_else(|error| {
                warn!(
                    event_name = "conversation.payload_undecodable",
                    device_id = %device.device_id,
                    error = %error,
                    "telemetry payload could not be decoded"
                );
                Value::String(NO_READING.to_string())
            }),
            None => Value::String(NO_READING.to_string()),
        },
        Err(error) => {
            warn!(
                event_name = "conversation.telemetry_unavailable",
                device_id = %device.device_id,
                error = %error,
                "last-event lookup failed; reporting no reading"
            );
            Value::String(NO_READING.to_string())
        }
    };

    let update =
        ProfileUpdate::sensor_value(&state.dialog_id, request.client_id.clone(), reading.clone());
    state.dialog.update_profile(&update).await.map_err(dialog_error)?;

    let mut turn = state
        .dialog
        .converse(&params.with_input(DISPLAY_SENSOR_VALUE))
        .await
        .map_err(dialog_error)?;

    if let Some(range) = &state.comfort {
        if let Some(advisory) = range.advisory(&reading) {
            if let Some(first) = turn.response.first_mut() {
                first.push_str(&advisory);
            }
        }
    }

    Ok(envelope(&state.dialog_id, turn))
}

/// Fetch the stored session profile; the upstream JSON is returned verbatim.
pub async fn profile(
    State(state): State<AppState>,
    Json(request): Json<ProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let params = ProfileParams {
        dialog_id: state.dialog_id.clone(),
        client_id: request.client_id,
        extra: request.extra,
    };
    let stored = state.dialog.get_profile(&params).await.map_err(dialog_error)?;
    Ok(Json(stored))
}

#[cfg(test)]
pub(crate) mod test_support {
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::Value;

    use roomsense_clients::{
        ConversationClient, ConversationError, DirectoryClient, DirectoryError,
    };
    use roomsense_core::{
        ConversationParams, ConversationTurn, DeviceEvent, DeviceRecord, ProfileParams,
        ProfileUpdate,
    };

    /// Stand-in clients for tests that never reach the remote seams.
    pub(crate) struct NoopDialog;

    #[async_trait]
    impl ConversationClient for NoopDialog {
        async fn converse(
            &self,
            _params: &ConversationParams,
        ) -> Result<ConversationTurn, ConversationError> {
            Err(ConversationError::Status {
                status: StatusCode::NOT_IMPLEMENTED,
                body: "noop".into(),
            })
        }

        async fn get_profile(&self, _params: &ProfileParams) -> Result<Value, ConversationError> {
            Err(ConversationError::Status {
                status: StatusCode::NOT_IMPLEMENTED,
                body: "noop".into(),
            })
        }

        async fn update_profile(&self, _update: &ProfileUpdate) -> Result<(), ConversationError> {
            Err(ConversationError::Status {
                status: StatusCode::NOT_IMPLEMENTED,
                body: "noop".into(),
            })
        }
    }

    pub(crate) struct NoopDirectory;

    #[async_trait]
    impl DirectoryClient for NoopDirectory {
        async fn list_devices(&self) -> Result<Vec<DeviceRecord>, DirectoryError> {
            Err(DirectoryError::Status { status: StatusCode::NOT_IMPLEMENTED, body: "noop".into() })
        }

        async fn last_events(
            &self,
            _type_id: &str,
            _device_id: &str,
        ) -> Result<Vec<DeviceEvent>, DirectoryError> {
            Err(DirectoryError::Status { status: StatusCode::NOT_IMPLEMENTED, body: "noop".into() })
        }
    }
}
