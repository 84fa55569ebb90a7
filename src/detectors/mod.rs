//! Per-signal detectors
//!
//! Every detector is a stateless function of one patient's records. Each one filters
//! for the signal types it understands, so records of any other type are ignored.

pub mod blood_pressure;
pub mod ecg;
pub mod saturation;
pub mod staff;

use crate::alerts::Alert;
use crate::records::MeasurementRecord;

pub use blood_pressure::{detect_threshold_trend, BloodPressureDetector, ThresholdTrendRule};
pub use ecg::{EcgDetector, ZeroDurationPolicy};
pub use saturation::SaturationDetector;
pub use staff::StaffAlertDetector;

/// Candidate alert producer for one signal family
pub trait Detector: Send + Sync {
    /// Detector name for logging
    fn name(&self) -> &'static str;

    /// Candidate alerts for `patient_id`. `records` may be unordered and contain any
    /// signal type.
    fn detect(&self, patient_id: &str, records: &[MeasurementRecord]) -> Vec<Alert>;
}

/// The standard detector sequence. Order matters: deduplication keeps the first alert
/// seen per condition.
pub fn default_detectors(ecg: EcgDetector) -> Vec<Box<dyn Detector>> {
    vec![
        Box::new(StaffAlertDetector::new()),
        Box::new(BloodPressureDetector::new()),
        Box::new(SaturationDetector::new()),
        Box::new(ecg),
    ]
}
