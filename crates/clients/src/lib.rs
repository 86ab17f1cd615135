//! Remote-service clients for roomsense.
//!
//! Two narrow seams, one per upstream:
//! - **Dialog service** (`dialog`) — advance a scripted conversation,
//!   read and update session profiles.
//! - **Device-management service** (`iot`) — list the device inventory,
//!   fetch the latest telemetry events per device.
//!
//! Production code injects the reqwest-backed implementations built from
//! `AppConfig`; tests inject scripted fakes behind the same traits.

pub mod dialog;
pub mod iot;

pub use dialog::{ConversationClient, ConversationError, HttpConversationClient};
pub use iot::{DirectoryClient, DirectoryError, HttpDirectoryClient};
