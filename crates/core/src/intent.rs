//! Classification of dialog replies into recognized follow-up actions.
//!
//! The hosted dialog script embeds fixed marker phrases in its replies when
//! it expects the backend to supply live device data. Matching is exact and
//! case-sensitive because the markers are authored into the dialog script
//! itself; loosening the match would fire on ordinary conversation text.

const OFFICE_CHOICE_MARKER: &str = "could be in one of the following office(s)";
const OFFICE_LISTING_MARKER: &str = "here are the list of offices";
const SENSOR_VALUE_MARKER: &str = "VALUE";

/// Recognized follow-up action for a dialog reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// The dialog offered a choice of office locations and needs the device list.
    DeviceList,
    /// The dialog is asking the backend to display a sensor reading.
    DeviceValue,
    /// No recognized marker; the reply goes back to the caller untouched.
    None,
}

/// Classify a joined dialog reply. Pure; the list markers win over the
/// value marker when both appear.
pub fn classify(transcript: &str) -> Intent {
    if transcript.contains(OFFICE_CHOICE_MARKER) || transcript.contains(OFFICE_LISTING_MARKER) {
        Intent::DeviceList
    } else if transcript.contains(SENSOR_VALUE_MARKER) {
        Intent::DeviceValue
    } else {
        Intent::None
    }
}
