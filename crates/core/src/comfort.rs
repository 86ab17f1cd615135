//! Comfort-band advisory appended to sensor-value replies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive comfortable band for a numeric reading. Optional: when absent
/// from the configuration, replies carry the raw reading only.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct ComfortRange {
    pub min: f64,
    pub max: f64,
}

impl ComfortRange {
    /// Advisory sentence for a reading, or `None` when the reading is not
    /// numeric (string readings and the `"NO"` sentinel pass through).
    pub fn advisory(&self, reading: &Value) -> Option<String> {
        let value = reading.as_f64()?;
        let message = if value < self.min {
            format!(
                " This temperature is below the comfortable limit of {} - {} degrees. \
                 Increase the temperature of your room.",
                self.min, self.max
            )
        } else if value > self.max {
            format!(
                " This temperature is above the comfortable limit of {} - {} degrees. \
                 Decrease the temperature of your room.",
                self.min, self.max
            )
        } else {
            format!(
                " This temperature is in the comfortable limit of {} - {} degrees.",
                self.min, self.max
            )
        };
        Some(message)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::ComfortRange;

    const RANGE: ComfortRange = ComfortRange { min: 24.0, max: 28.0 };

    #[test]
    fn below_band_advises_an_increase() {
        let advisory = RANGE.advisory(&json!(20)).expect("numeric reading");
        assert!(advisory.contains("below the comfortable limit"));
        assert!(advisory.contains("24 - 28"));
    }

    #[test]
    fn above_band_advises_a_decrease() {
        let advisory = RANGE.advisory(&json!(31.5)).expect("numeric reading");
        assert!(advisory.contains("above the comfortable limit"));
    }

    #[test]
    fn within_band_confirms_comfort() {
        let advisory = RANGE.advisory(&json!(26)).expect("numeric reading");
        assert!(advisory.contains("in the comfortable limit"));
    }

    #[test]
    fn non_numeric_reading_has_no_advisory() {
        assert_eq!(RANGE.advisory(&json!("NO")), None);
        assert_eq!(RANGE.advisory(&json!({"nested": 1})), None);
    }
}
