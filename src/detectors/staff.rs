//! Staff-triggered alerts pass straight through as high-priority alerts

use super::Detector;
use crate::alerts::alert::STAFF_TRIGGERED;
use crate::alerts::Alert;
use crate::records::types::{sorted_stream, MeasurementRecord, SignalType};

/// Value recorded when staff press the alert button (resolution is recorded as 0)
pub const TRIGGERED_VALUE: f64 = 1.0;

#[derive(Debug, Default)]
pub struct StaffAlertDetector;

impl StaffAlertDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for StaffAlertDetector {
    fn name(&self) -> &'static str {
        "staff_alert"
    }

    fn detect(&self, patient_id: &str, records: &[MeasurementRecord]) -> Vec<Alert> {
        sorted_stream(records, SignalType::StaffAlert)
            .into_iter()
            .filter(|r| r.value == TRIGGERED_VALUE)
            .map(|r| Alert::high_priority(patient_id, STAFF_TRIGGERED, r.timestamp))
            .collect()
    }
}
