//! Device inventory types and the in-memory directory snapshot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata label preferred over the raw device id as the display key.
const LABEL_KEY: &str = "Office Number";

/// One device as reported by the device-management service.
///
/// Metadata is an arbitrary mapping maintained by whoever registered the
/// device; only the office-number label is interpreted here.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    pub type_id: String,
    pub device_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DeviceRecord {
    /// Key the device is presented under: the human-readable office label
    /// when the registration carries one, else the raw device id.
    pub fn display_key(&self) -> &str {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get(LABEL_KEY))
            .and_then(Value::as_str)
            .unwrap_or(&self.device_id)
    }
}

/// The most recent telemetry event for a device. The payload is a
/// base64-encoded JSON document; see [`crate::sensor`].
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEvent {
    pub payload: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Immutable snapshot of the device inventory keyed by display key.
///
/// Rebuilt wholesale from a fresh listing and swapped in atomically; a
/// snapshot is never mutated after construction, so concurrent readers can
/// hold it across await points without observing a half-built map.
#[derive(Clone, Debug, Default)]
pub struct DeviceDirectory {
    entries: BTreeMap<String, DeviceRecord>,
}

impl DeviceDirectory {
    /// Build a snapshot from a full listing. Display-key collisions are
    /// last-write-wins, matching the listing order of the upstream service.
    pub fn from_records(records: Vec<DeviceRecord>) -> Self {
        let mut entries = BTreeMap::new();
        for record in records {
            entries.insert(record.display_key().to_string(), record);
        }
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&DeviceRecord> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{DeviceDirectory, DeviceRecord};

    fn record(device_id: &str, label: Option<&str>) -> DeviceRecord {
        let metadata = label.map(|label| {
            json!({ "Office Number": label }).as_object().cloned().expect("object literal")
        });
        DeviceRecord {
            type_id: "thermostat".to_string(),
            device_id: device_id.to_string(),
            metadata,
            extra: Default::default(),
        }
    }

    #[test]
    fn label_is_preferred_over_device_id() {
        assert_eq!(record("d2", Some("101")).display_key(), "101");
    }

    #[test]
    fn device_id_is_the_fallback_key() {
        assert_eq!(record("d1", None).display_key(), "d1");
    }

    #[test]
    fn non_string_label_falls_back_to_device_id() {
        let mut record = record("d3", None);
        record.metadata = json!({ "Office Number": 101 }).as_object().cloned();
        assert_eq!(record.display_key(), "d3");
    }

    #[test]
    fn directory_keys_cover_labels_and_ids() {
        let directory =
            DeviceDirectory::from_records(vec![record("d1", None), record("d2", Some("101"))]);

        let keys: Vec<&str> = directory.keys().collect();
        assert_eq!(keys, vec!["101", "d1"]);
        assert_eq!(directory.get("101").map(|r| r.device_id.as_str()), Some("d2"));
        assert_eq!(directory.get("d1").map(|r| r.device_id.as_str()), Some("d1"));
    }

    #[test]
    fn label_collision_is_last_write_wins() {
        let directory =
            DeviceDirectory::from_records(vec![record("d1", Some("101")), record("d2", Some("101"))]);

        assert_eq!(directory.len(), 1);
        assert_eq!(directory.get("101").map(|r| r.device_id.as_str()), Some("d2"));
    }

    #[test]
    fn record_deserializes_from_service_listing() {
        let record: DeviceRecord = serde_json::from_value(json!({
            "typeId": "thermostat",
            "deviceId": "dev-7",
            "metadata": { "Office Number": "314" },
            "registration": { "auth": { "id": "a-1" } }
        }))
        .expect("listing entry should deserialize");

        assert_eq!(record.display_key(), "314");
        assert!(record.extra.contains_key("registration"));
    }
}
