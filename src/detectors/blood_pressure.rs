//! Blood pressure detection: critical bounds and dangerous trends
//!
//! Systolic and diastolic streams share one threshold+trend routine; only the
//! [`ThresholdTrendRule`] differs.

use super::Detector;
use crate::alerts::alert::{DIASTOLIC_CRITICAL, DIASTOLIC_TREND, SYSTOLIC_CRITICAL, SYSTOLIC_TREND};
use crate::alerts::Alert;
use crate::records::types::{sorted_stream, MeasurementRecord, SignalType};

/// Minimum change (mmHg) between consecutive readings that counts toward a trend
pub const TREND_THRESHOLD: f64 = 10.0;
/// Readings in a trend run (so `TREND_READINGS - 1` qualifying changes)
pub const TREND_READINGS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct ThresholdTrendRule {
    pub signal: SignalType,
    pub critical_min: f64,
    pub critical_max: f64,
    pub trend_condition: &'static str,
    pub critical_condition: &'static str,
}

impl ThresholdTrendRule {
    pub const fn systolic() -> Self {
        Self {
            signal: SignalType::SystolicPressure,
            critical_min: 90.0,
            critical_max: 180.0,
            trend_condition: SYSTOLIC_TREND,
            critical_condition: SYSTOLIC_CRITICAL,
        }
    }

    pub const fn diastolic() -> Self {
        Self {
            signal: SignalType::DiastolicPressure,
            critical_min: 60.0,
            critical_max: 120.0,
            trend_condition: DIASTOLIC_TREND,
            critical_condition: DIASTOLIC_CRITICAL,
        }
    }

    fn is_critical(&self, value: f64) -> bool {
        value < self.critical_min || value > self.critical_max
    }
}

/// Run one rule over the patient's records.
///
/// Readings are walked oldest first. A step is "alternated" when its change has the
/// opposite sign of the previous step; alternation or a small change resets the run.
/// Trend alerts carry the timestamp of the first reading of the run.
pub fn detect_threshold_trend(
    rule: &ThresholdTrendRule,
    patient_id: &str,
    records: &[MeasurementRecord],
) -> Vec<Alert> {
    let stream = sorted_stream(records, rule.signal);
    let mut alerts = Vec::new();

    let mut run = 0usize;
    let mut previous_change = 0.0f64;

    for i in 0..stream.len().saturating_sub(1) {
        let change = stream[i].value - stream[i + 1].value;
        let alternated = previous_change * change < 0.0;
        previous_change = change;

        if change.abs() > TREND_THRESHOLD && !alternated {
            run += 1;
        } else {
            run = 0;
        }

        if run == TREND_READINGS - 1 {
            let run_start = stream[i + 2 - TREND_READINGS];
            alerts.push(Alert::new(patient_id, rule.trend_condition, run_start.timestamp));
        }
    }

    for reading in &stream {
        if rule.is_critical(reading.value) {
            alerts.push(Alert::new(patient_id, rule.critical_condition, reading.timestamp));
        }
    }

    alerts
}

pub struct BloodPressureDetector {
    rules: [ThresholdTrendRule; 2],
}

impl BloodPressureDetector {
    pub fn new() -> Self {
        Self {
            rules: [ThresholdTrendRule::systolic(), ThresholdTrendRule::diastolic()],
        }
    }
}

impl Default for BloodPressureDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for BloodPressureDetector {
    fn name(&self) -> &'static str {
        "blood_pressure"
    }

    fn detect(&self, patient_id: &str, records: &[MeasurementRecord]) -> Vec<Alert> {
        self.rules
            .iter()
            .flat_map(|rule| detect_threshold_trend(rule, patient_id, records))
            .collect()
    }
}
