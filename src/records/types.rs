//! Measurement record model shared by every record source and detector

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physiological measurement category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    SystolicPressure,
    DiastolicPressure,
    Saturation,
    #[serde(rename = "ECG")]
    Ecg,
    WhiteBloodCells,
    RedBloodCells,
    Cholesterol,
    #[serde(rename = "Alert", alias = "StaffAlert")]
    StaffAlert,
}

impl SignalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::SystolicPressure => "SystolicPressure",
            SignalType::DiastolicPressure => "DiastolicPressure",
            SignalType::Saturation => "Saturation",
            SignalType::Ecg => "ECG",
            SignalType::WhiteBloodCells => "WhiteBloodCells",
            SignalType::RedBloodCells => "RedBloodCells",
            SignalType::Cholesterol => "Cholesterol",
            SignalType::StaffAlert => "Alert",
        }
    }

    /// Parse a label as written by the data generator. Unknown labels yield `None`.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "SystolicPressure" => Some(SignalType::SystolicPressure),
            "DiastolicPressure" => Some(SignalType::DiastolicPressure),
            "Saturation" => Some(SignalType::Saturation),
            "ECG" => Some(SignalType::Ecg),
            "WhiteBloodCells" => Some(SignalType::WhiteBloodCells),
            "RedBloodCells" => Some(SignalType::RedBloodCells),
            "Cholesterol" => Some(SignalType::Cholesterol),
            "Alert" | "StaffAlert" => Some(SignalType::StaffAlert),
            _ => None,
        }
    }

    pub fn all() -> [SignalType; 8] {
        [
            SignalType::SystolicPressure,
            SignalType::DiastolicPressure,
            SignalType::Saturation,
            SignalType::Ecg,
            SignalType::WhiteBloodCells,
            SignalType::RedBloodCells,
            SignalType::Cholesterol,
            SignalType::StaffAlert,
        ]
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable measurement for one patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub patient_id: String,
    pub signal_type: SignalType,
    pub value: f64,
    /// Milliseconds since epoch; not required to be unique
    pub timestamp: i64,
}

impl MeasurementRecord {
    pub fn new(
        patient_id: impl Into<String>,
        signal_type: SignalType,
        value: f64,
        timestamp: i64,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            signal_type,
            value,
            timestamp,
        }
    }

    /// Parse a record from a JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Records of one signal type, sorted ascending by timestamp.
///
/// The sort is stable, so records sharing a timestamp keep their source order.
pub fn sorted_stream(records: &[MeasurementRecord], signal: SignalType) -> Vec<&MeasurementRecord> {
    let mut stream: Vec<&MeasurementRecord> = records
        .iter()
        .filter(|r| r.signal_type == signal)
        .collect();
    stream.sort_by_key(|r| r.timestamp);
    stream
}
