use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::comfort::ComfortRange;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub dialog: DialogConfig,
    pub iot: IotConfig,
    pub server: ServerConfig,
    pub comfort: Option<ComfortRange>,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DialogConfig {
    pub url: String,
    pub username: String,
    pub password: SecretString,
    pub dialog_id: Option<String>,
    pub dialog_id_file: PathBuf,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct IotConfig {
    pub url: String,
    pub api_key: String,
    pub api_token: SecretString,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub dialog_url: Option<String>,
    pub dialog_username: Option<String>,
    pub dialog_password: Option<String>,
    pub dialog_id: Option<String>,
    pub dialog_id_file: Option<PathBuf>,
    pub iot_url: Option<String>,
    pub iot_api_key: Option<String>,
    pub iot_api_token: Option<String>,
    pub server_port: Option<u16>,
    pub comfort: Option<ComfortRange>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("could not read dialog identifier file `{path}`: {source}")]
    DialogIdFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse dialog identifier file `{path}`: {source}")]
    DialogIdParse { path: PathBuf, source: serde_json::Error },
    #[error("no dialog identifier resolved: set ROOMSENSE_DIALOG_ID or provide `{0}`")]
    MissingDialogId(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dialog: DialogConfig {
                url: "https://gateway.watsonplatform.net/dialog/api".to_string(),
                username: String::new(),
                password: String::new().into(),
                dialog_id: None,
                dialog_id_file: PathBuf::from("dialogs/dialog-id.json"),
                timeout_secs: 30,
            },
            iot: IotConfig {
                url: "http://127.0.0.1:8081/api/v0002".to_string(),
                api_key: String::new(),
                api_token: String::new().into(),
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3001,
            },
            comfort: None,
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("roomsense.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(dialog) = patch.dialog {
            if let Some(url) = dialog.url {
                self.dialog.url = url;
            }
            if let Some(username) = dialog.username {
                self.dialog.username = username;
            }
            if let Some(dialog_password_value) = dialog.password {
                self.dialog.password = secret_value(dialog_password_value);
            }
            if let Some(dialog_id) = dialog.dialog_id {
                self.dialog.dialog_id = Some(dialog_id);
            }
            if let Some(dialog_id_file) = dialog.dialog_id_file {
                self.dialog.dialog_id_file = dialog_id_file;
            }
            if let Some(timeout_secs) = dialog.timeout_secs {
                self.dialog.timeout_secs = timeout_secs;
            }
        }

        if let Some(iot) = patch.iot {
            if let Some(url) = iot.url {
                self.iot.url = url;
            }
            if let Some(api_key) = iot.api_key {
                self.iot.api_key = api_key;
            }
            if let Some(iot_api_token_value) = iot.api_token {
                self.iot.api_token = secret_value(iot_api_token_value);
            }
            if let Some(timeout_secs) = iot.timeout_secs {
                self.iot.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(comfort) = patch.comfort {
            self.comfort = Some(comfort);
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ROOMSENSE_DIALOG_URL") {
            self.dialog.url = value;
        }
        if let Some(value) = read_env("ROOMSENSE_DIALOG_USERNAME") {
            self.dialog.username = value;
        }
        if let Some(value) = read_env("ROOMSENSE_DIALOG_PASSWORD") {
            self.dialog.password = secret_value(value);
        }
        // DIALOG_ID is the name the original deployment environment used.
        let dialog_id = read_env("ROOMSENSE_DIALOG_ID").or_else(|| read_env("DIALOG_ID"));
        if let Some(value) = dialog_id {
            self.dialog.dialog_id = Some(value);
        }
        if let Some(value) = read_env("ROOMSENSE_DIALOG_ID_FILE") {
            self.dialog.dialog_id_file = PathBuf::from(value);
        }
        if let Some(value) = read_env("ROOMSENSE_DIALOG_TIMEOUT_SECS") {
            self.dialog.timeout_secs = parse_u64("ROOMSENSE_DIALOG_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ROOMSENSE_IOT_URL") {
            self.iot.url = value;
        }
        if let Some(value) = read_env("ROOMSENSE_IOT_API_KEY") {
            self.iot.api_key = value;
        }
        if let Some(value) = read_env("ROOMSENSE_IOT_API_TOKEN") {
            self.iot.api_token = secret_value(value);
        }
        if let Some(value) = read_env("ROOMSENSE_IOT_TIMEOUT_SECS") {
            self.iot.timeout_secs = parse_u64("ROOMSENSE_IOT_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ROOMSENSE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        // VCAP_APP_PORT is the port variable of the original hosting platform.
        let port = read_env("ROOMSENSE_SERVER_PORT")
            .map(|value| ("ROOMSENSE_SERVER_PORT", value))
            .or_else(|| read_env("VCAP_APP_PORT").map(|value| ("VCAP_APP_PORT", value)));
        if let Some((key, value)) = port {
            self.server.port = parse_u16(key, &value)?;
        }
        let log_level =
            read_env("ROOMSENSE_LOGGING_LEVEL").or_else(|| read_env("ROOMSENSE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ROOMSENSE_LOGGING_FORMAT").or_else(|| read_env("ROOMSENSE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dialog_url) = overrides.dialog_url {
            self.dialog.url = dialog_url;
        }
        if let Some(dialog_username) = overrides.dialog_username {
            self.dialog.username = dialog_username;
        }
        if let Some(dialog_password) = overrides.dialog_password {
            self.dialog.password = secret_value(dialog_password);
        }
        if let Some(dialog_id) = overrides.dialog_id {
            self.dialog.dialog_id = Some(dialog_id);
        }
        if let Some(dialog_id_file) = overrides.dialog_id_file {
            self.dialog.dialog_id_file = dialog_id_file;
        }
        if let Some(iot_url) = overrides.iot_url {
            self.iot.url = iot_url;
        }
        if let Some(iot_api_key) = overrides.iot_api_key {
            self.iot.api_key = iot_api_key;
        }
        if let Some(iot_api_token) = overrides.iot_api_token {
            self.iot.api_token = secret_value(iot_api_token);
        }
        if let Some(server_port) = overrides.server_port {
            self.server.port = server_port;
        }
        if let Some(comfort) = overrides.comfort {
            self.comfort = Some(comfort);
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dialog.url.trim().is_empty() {
            return Err(ConfigError::Validation("dialog.url must not be empty".to_string()));
        }
        if self.iot.url.trim().is_empty() {
            return Err(ConfigError::Validation("iot.url must not be empty".to_string()));
        }
        if self.dialog.timeout_secs == 0 || self.iot.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "client timeouts must be at least one second".to_string(),
            ));
        }
        if let Some(comfort) = &self.comfort {
            if comfort.min > comfort.max {
                return Err(ConfigError::Validation(format!(
                    "comfort.min ({}) must not exceed comfort.max ({})",
                    comfort.min, comfort.max
                )));
            }
        }
        Ok(())
    }
}

impl DialogConfig {
    /// Resolve the process-lifetime dialog identifier.
    ///
    /// Precedence: explicit value (environment or config) over the first
    /// entry of the bundled identifier file, a JSON object mapping dialog
    /// name to `{ "id": ... }`. Fails when neither source yields an id so
    /// the process stops at startup rather than erroring per request.
    pub fn resolve_dialog_id(&self) -> Result<String, ConfigError> {
        if let Some(id) = self.dialog_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
            return Ok(id.to_string());
        }

        let raw = fs::read_to_string(&self.dialog_id_file).map_err(|source| {
            ConfigError::DialogIdFile { path: self.dialog_id_file.clone(), source }
        })?;
        let entries: serde_json::Map<String, Value> =
            serde_json::from_str(&raw).map_err(|source| ConfigError::DialogIdParse {
                path: self.dialog_id_file.clone(),
                source,
            })?;

        entries
            .values()
            .find_map(|entry| entry.get("id").and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingDialogId(self.dialog_id_file.clone()))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    dialog: Option<DialogPatch>,
    iot: Option<IotPatch>,
    server: Option<ServerPatch>,
    comfort: Option<ComfortRange>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DialogPatch {
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    dialog_id: Option<String>,
    dialog_id_file: Option<PathBuf>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct IotPatch {
    url: Option<String>,
    api_key: Option<String>,
    api_token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    let candidate = explicit.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("roomsense.toml"));
    candidate.is_file().then_some(candidate)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}
