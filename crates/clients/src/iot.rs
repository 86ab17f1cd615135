//! Device-management service client: inventory and latest telemetry.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;

use roomsense_core::config::IotConfig;
use roomsense_core::{DeviceEvent, DeviceRecord};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("device directory request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("device directory returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Operations the backend consumes from the device-management service.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// List the whole device inventory of the organization.
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, DirectoryError>;

    /// Most recent telemetry events for one device, newest first. An empty
    /// list means the device has never published.
    async fn last_events(
        &self,
        type_id: &str,
        device_id: &str,
    ) -> Result<Vec<DeviceEvent>, DirectoryError>;
}

/// Paged shape of the bulk listing endpoint; only the records matter here.
#[derive(Debug, Deserialize)]
struct DeviceListPage {
    results: Vec<DeviceRecord>,
}

pub struct HttpDirectoryClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_token: SecretString,
}

impl HttpDirectoryClient {
    pub fn new(config: &IotConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            api_token: config.api_token.clone(),
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, DirectoryError> {
        let response = self
            .client
            .get(url)
            .basic_auth(&self.api_key, Some(self.api_token.expose_secret()))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DirectoryError::Status { status, body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl DirectoryClient for HttpDirectoryClient {
    async fn list_devices(&self) -> Result<Vec<DeviceRecord>, DirectoryError> {
        let url = format!("{}/bulk/devices", self.base_url);
        debug!("listing device inventory");
        let page: DeviceListPage = self.get_json(&url).await?;
        Ok(page.results)
    }

    async fn last_events(
        &self,
        type_id: &str,
        device_id: &str,
    ) -> Result<Vec<DeviceEvent>, DirectoryError> {
        let url = format!("{}/device/types/{type_id}/devices/{device_id}/events", self.base_url);
        debug!(type_id, device_id, "fetching last telemetry events");
        self.get_json(&url).await
    }
}
