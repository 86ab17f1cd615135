pub mod comfort;
pub mod config;
pub mod conversation;
pub mod directory;
pub mod intent;
pub mod sensor;

pub use comfort::ComfortRange;
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
pub use conversation::{
    ConversationParams, ConversationRequest, ConversationTurn, NameValue, ProfileParams,
    ProfileUpdate, BIND_IOT_MESSAGE, DISPLAY_NO_DEVICE, DISPLAY_SENSOR_VALUE, SENSOR_FIELD,
};
pub use directory::{DeviceDirectory, DeviceEvent, DeviceRecord};
pub use intent::{classify, Intent};
pub use sensor::{decode_sensor_field, DecodeError};
