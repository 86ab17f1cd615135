//! Dialog-service client: conversation turns and session profiles.
//!
//! The upstream is the hosted dialog API (v1): conversation advances are
//! form-encoded posts against a dialog-scoped endpoint, profile reads and
//! writes share the `/profile` resource. All calls authenticate with the
//! service-instance basic credentials.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::debug;

use roomsense_core::config::DialogConfig;
use roomsense_core::{ConversationParams, ConversationTurn, ProfileParams, ProfileUpdate};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversationError {
    #[error("dialog service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("dialog service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Operations the backend consumes from the dialog service.
#[async_trait]
pub trait ConversationClient: Send + Sync {
    /// Advance the conversation one turn.
    async fn converse(&self, params: &ConversationParams)
        -> Result<ConversationTurn, ConversationError>;

    /// Fetch the stored session profile verbatim.
    async fn get_profile(&self, params: &ProfileParams) -> Result<Value, ConversationError>;

    /// Write named session attributes back into the dialog session.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ConversationError>;
}

pub struct HttpConversationClient {
    client: Client,
    base_url: String,
    username: String,
    password: SecretString,
}

impl HttpConversationClient {
    pub fn new(config: &DialogConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn dialog_endpoint(&self, dialog_id: &str, resource: &str) -> String {
        format!("{}/v1/dialogs/{dialog_id}/{resource}", self.base_url)
    }
}

/// Render a JSON value as a form field. Nested structures are skipped: the
/// upstream form encoding has no representation for them, and dropping
/// them beats failing the whole request over an unknown passthrough field.
fn form_value(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn form_pairs(params: &ConversationParams) -> Vec<(String, String)> {
    let mut pairs = vec![("input".to_string(), params.input.clone())];
    if let Some(client_id) = params.client_id.as_ref().and_then(form_value) {
        pairs.push(("client_id".to_string(), client_id));
    }
    for (key, value) in &params.extra {
        if let Some(value) = form_value(value) {
            pairs.push((key.clone(), value));
        }
    }
    pairs
}

fn profile_query(params: &ProfileParams) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(client_id) = params.client_id.as_ref().and_then(form_value) {
        pairs.push(("client_id".to_string(), client_id));
    }
    for (key, value) in &params.extra {
        if let Some(value) = form_value(value) {
            pairs.push((key.clone(), value));
        }
    }
    pairs
}

async fn reject_non_success(response: reqwest::Response) -> Result<reqwest::Response, ConversationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ConversationError::Status { status, body })
}

#[async_trait]
impl ConversationClient for HttpConversationClient {
    async fn converse(
        &self,
        params: &ConversationParams,
    ) -> Result<ConversationTurn, ConversationError> {
        let url = self.dialog_endpoint(&params.dialog_id, "conversation");
        debug!(dialog_id = %params.dialog_id, "advancing conversation");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .form(&form_pairs(params))
            .send()
            .await?;
        let response = reject_non_success(response).await?;
        Ok(response.json().await?)
    }

    async fn get_profile(&self, params: &ProfileParams) -> Result<Value, ConversationError> {
        let url = self.dialog_endpoint(&params.dialog_id, "profile");
        let mut request = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(self.password.expose_secret()));
        let query = profile_query(params);
        if !query.is_empty() {
            request = request.query(&query);
        }

        let response = reject_non_success(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ConversationError> {
        let url = self.dialog_endpoint(&update.dialog_id, "profile");
        debug!(dialog_id = %update.dialog_id, "updating session profile");

        let response = self
            .client
            .put(&url)
            .basic_auth(&self.username, Some(self.password.expose_secret()))
            .json(update)
            .send()
            .await?;
        reject_non_success(response).await?;
        Ok(())
    }
}
