//! Alert value object and the closed set of condition strings
//!
//! Correlation and deduplication key off exact condition equality, so every producer
//! must use these constants rather than formatting its own strings.

use serde::{Deserialize, Serialize};

pub const SYSTOLIC_TREND: &str = "SystolicPressure dangerous trend";
pub const SYSTOLIC_CRITICAL: &str = "SystolicPressure critical value reached";
pub const DIASTOLIC_TREND: &str = "DiastolicPressure dangerous trend";
pub const DIASTOLIC_CRITICAL: &str = "DiastolicPressure critical value reached";
pub const LOW_SATURATION: &str = "Low Saturation of oxygen in blood";
pub const RAPID_SATURATION_DROP: &str = "Rapid drop of oxygen in blood";
pub const ABNORMAL_HEART_RATE: &str = "Abnormal Heart Rate";
pub const IRREGULAR_BEAT: &str = "Irregular Beat Pattern";
pub const STAFF_TRIGGERED: &str = "Triggered Alert";
pub const HYPOTENSIVE_HYPOXEMIA: &str = "Hypotensive Hypoxemia Alert";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertPriority {
    #[serde(rename = "NORMAL")]
    Normal,
    #[serde(rename = "HIGH")]
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub patient_id: String,
    pub condition: String,
    /// Timestamp of the triggering record (the earlier record for composites)
    pub timestamp: i64,
    pub priority: AlertPriority,
}

impl Alert {
    pub fn new(patient_id: impl Into<String>, condition: &str, timestamp: i64) -> Self {
        Self {
            patient_id: patient_id.into(),
            condition: condition.to_string(),
            timestamp,
            priority: AlertPriority::Normal,
        }
    }

    pub fn high_priority(patient_id: impl Into<String>, condition: &str, timestamp: i64) -> Self {
        Self {
            priority: AlertPriority::High,
            ..Self::new(patient_id, condition, timestamp)
        }
    }

    pub fn is_high_priority(&self) -> bool {
        matches!(self.priority, AlertPriority::High)
    }
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_high_priority() {
            write!(f, "Priority ")?;
        }
        write!(
            f,
            "Alert: patient={} condition=\"{}\" timestamp={}",
            self.patient_id, self.condition, self.timestamp
        )
    }
}
