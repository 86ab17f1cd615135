use std::sync::Arc;

use roomsense_clients::{HttpConversationClient, HttpDirectoryClient};
use roomsense_core::config::{AppConfig, ConfigError};
use thiserror::Error;
use tracing::info;

use crate::routes::AppState;

pub struct Application {
    pub config: AppConfig,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("http client construction failed: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Wire the remote clients and shared request state from a loaded config.
///
/// The dialog identifier is resolved exactly once here and stays fixed for
/// the process lifetime; an unresolvable id aborts startup.
pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let dialog_id = config.dialog.resolve_dialog_id()?;
    info!(
        event_name = "system.bootstrap.dialog_id_resolved",
        dialog_id = %dialog_id,
        "dialog identifier resolved"
    );

    let dialog = HttpConversationClient::new(&config.dialog).map_err(BootstrapError::HttpClient)?;
    let directory = HttpDirectoryClient::new(&config.iot).map_err(BootstrapError::HttpClient)?;

    let state = AppState::new(dialog_id, Arc::new(dialog), Arc::new(directory), config.comfort);
    info!(event_name = "system.bootstrap.clients_ready", "remote service clients constructed");

    Ok(Application { config, state })
}
