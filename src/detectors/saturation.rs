//! Blood oxygen saturation: low readings and rapid drops

use super::Detector;
use crate::alerts::alert::{LOW_SATURATION, RAPID_SATURATION_DROP};
use crate::alerts::Alert;
use crate::records::types::{sorted_stream, MeasurementRecord, SignalType};

/// Readings strictly below this percentage are critical
pub const CRITICAL_THRESHOLD: f64 = 92.0;
/// Percentage points lost within [`DROP_WINDOW_MS`] that count as a rapid drop
pub const DROP_THRESHOLD: f64 = 5.0;
pub const DROP_WINDOW_MS: i64 = 10 * 60 * 1000;

#[derive(Debug, Default)]
pub struct SaturationDetector;

impl SaturationDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for SaturationDetector {
    fn name(&self) -> &'static str {
        "saturation"
    }

    /// Each reading starts its own drop window; only the first qualifying drop in a
    /// window is reported, timestamped at the reading where it was observed.
    fn detect(&self, patient_id: &str, records: &[MeasurementRecord]) -> Vec<Alert> {
        let stream = sorted_stream(records, SignalType::Saturation);
        let mut alerts = Vec::new();

        for (i, current) in stream.iter().enumerate() {
            if current.value < CRITICAL_THRESHOLD {
                alerts.push(Alert::new(patient_id, LOW_SATURATION, current.timestamp));
            }

            let drop_at = stream[i + 1..]
                .iter()
                .take_while(|next| next.timestamp - current.timestamp <= DROP_WINDOW_MS)
                .find(|next| current.value - next.value >= DROP_THRESHOLD);

            if let Some(next) = drop_at {
                alerts.push(Alert::new(patient_id, RAPID_SATURATION_DROP, next.timestamp));
            }
        }

        alerts
    }
}
