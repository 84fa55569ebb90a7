//! ECG stream checks: heart rate over a sliding window and irregular beat timing

use super::Detector;
use crate::alerts::alert::{ABNORMAL_HEART_RATE, IRREGULAR_BEAT};
use crate::alerts::Alert;
use crate::records::types::{sorted_stream, MeasurementRecord, SignalType};

/// Records per heart-rate window
pub const WINDOW_SIZE: usize = 10;
pub const HEART_RATE_MIN_BPM: f64 = 50.0;
pub const HEART_RATE_MAX_BPM: f64 = 100.0;
pub const DEFAULT_VARIANCE_MULTIPLIER: f64 = 3.6;

const MS_PER_MINUTE: f64 = 60_000.0;

/// What to do with a heart-rate window whose records all share one timestamp.
///
/// Such a window has a computed rate of zero beats per minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroDurationPolicy {
    /// No alert; a zero-length window carries no rate information
    #[default]
    Suppress,
    /// Treat the zero rate as real, which is always below the lower bound
    Fire,
}

impl ZeroDurationPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "suppress" => Some(ZeroDurationPolicy::Suppress),
            "fire" => Some(ZeroDurationPolicy::Fire),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZeroDurationPolicy::Suppress => "suppress",
            ZeroDurationPolicy::Fire => "fire",
        }
    }
}

/// Beats per minute for a window of records; zero when the window spans no time
pub fn calculate_bpm(window: &[&MeasurementRecord]) -> f64 {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return 0.0;
    };

    let duration_minutes = (last.timestamp - first.timestamp) as f64 / MS_PER_MINUTE;
    if duration_minutes == 0.0 {
        return 0.0;
    }
    window.len() as f64 / duration_minutes
}

/// Mean and population standard deviation
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

#[derive(Debug, Clone)]
pub struct EcgDetector {
    variance_multiplier: f64,
    zero_duration: ZeroDurationPolicy,
}

impl EcgDetector {
    pub fn new(variance_multiplier: f64, zero_duration: ZeroDurationPolicy) -> Self {
        Self {
            variance_multiplier,
            zero_duration,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_VARIANCE_MULTIPLIER, ZeroDurationPolicy::default())
    }

    fn abnormal_rate(&self, patient_id: &str, stream: &[&MeasurementRecord]) -> Vec<Alert> {
        let mut alerts = Vec::new();
        if stream.len() < WINDOW_SIZE {
            return alerts;
        }

        for window in stream.windows(WINDOW_SIZE) {
            let first = window[0];
            let last = window[WINDOW_SIZE - 1];

            if first.timestamp == last.timestamp
                && self.zero_duration == ZeroDurationPolicy::Suppress
            {
                log::debug!(
                    "Skipping zero-duration ECG window for patient {} at {}",
                    patient_id,
                    last.timestamp
                );
                continue;
            }

            let bpm = calculate_bpm(window);
            if bpm < HEART_RATE_MIN_BPM || bpm > HEART_RATE_MAX_BPM {
                alerts.push(Alert::new(patient_id, ABNORMAL_HEART_RATE, last.timestamp));
            }
        }

        alerts
    }

    fn irregular_beats(&self, patient_id: &str, stream: &[&MeasurementRecord]) -> Vec<Alert> {
        if stream.len() < 2 {
            return Vec::new();
        }

        let intervals: Vec<f64> = stream
            .windows(2)
            .map(|pair| (pair[1].timestamp - pair[0].timestamp) as f64)
            .collect();
        let (mean, std_dev) = mean_and_std_dev(&intervals);
        let allowed = self.variance_multiplier * std_dev;

        intervals
            .iter()
            .enumerate()
            .filter(|(_, interval)| (**interval - mean).abs() > allowed)
            .map(|(k, _)| Alert::new(patient_id, IRREGULAR_BEAT, stream[k + 1].timestamp))
            .collect()
    }
}

impl Default for EcgDetector {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Detector for EcgDetector {
    fn name(&self) -> &'static str {
        "ecg"
    }

    fn detect(&self, patient_id: &str, records: &[MeasurementRecord]) -> Vec<Alert> {
        let stream = sorted_stream(records, SignalType::Ecg);

        let mut alerts = self.abnormal_rate(patient_id, &stream);
        alerts.extend(self.irregular_beats(patient_id, &stream));
        alerts
    }
}
