//! Monitor configuration from environment variables
//!
//! Clinical thresholds are fixed constants in the detectors; only operational settings
//! live here.

use crate::detectors::ZeroDurationPolicy;
use std::env;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { variable: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue { variable, value } => {
                write!(f, "Invalid value for {}: {:?}", variable, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which record source the monitor reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Files,
    Sqlite,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Files => "files",
            SourceKind::Sqlite => "sqlite",
        }
    }
}

/// `--source files|sqlite`; anything else falls back to files
pub fn parse_source_from_args(args: &[String]) -> SourceKind {
    if let Some(idx) = args.iter().position(|x| x == "--source") {
        if let Some("sqlite") = args.get(idx + 1).map(|s| s.as_str()) {
            return SourceKind::Sqlite;
        }
    }
    SourceKind::Files
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Directory of `<Label>.txt` / `*.jsonl` record files
    pub data_dir: PathBuf,

    /// SQLite database holding the `measurements` table
    pub db_path: PathBuf,

    /// Optional JSONL file every delivered alert is appended to
    pub alerts_output_path: Option<PathBuf>,

    pub evaluation_interval_secs: u64,

    /// How far back each pass looks; 0 evaluates the whole history
    pub lookback_mins: i64,

    pub ecg_variance_multiplier: f64,

    pub zero_duration_policy: ZeroDurationPolicy,
}

impl MonitorConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `VITALS_DATA_DIR` (default: data/records)
    /// - `VITALS_DB_PATH` (default: data/vitals.db)
    /// - `ALERTS_OUTPUT_PATH` (default: unset)
    /// - `EVALUATION_INTERVAL_SECS` (default: 60)
    /// - `EVALUATION_LOOKBACK_MINS` (default: 0)
    /// - `ECG_VARIANCE_MULTIPLIER` (default: 3.6, must be positive)
    /// - `ZERO_DURATION_BPM_POLICY` (default: suppress)
    pub fn from_env() -> Result<Self, ConfigError> {
        let ecg_variance_multiplier = env::var("ECG_VARIANCE_MULTIPLIER")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(crate::detectors::ecg::DEFAULT_VARIANCE_MULTIPLIER);
        if !(ecg_variance_multiplier > 0.0) {
            return Err(ConfigError::InvalidValue {
                variable: "ECG_VARIANCE_MULTIPLIER",
                value: ecg_variance_multiplier.to_string(),
            });
        }

        let zero_duration_policy = match env::var("ZERO_DURATION_BPM_POLICY") {
            Ok(s) => ZeroDurationPolicy::from_str(&s).ok_or(ConfigError::InvalidValue {
                variable: "ZERO_DURATION_BPM_POLICY",
                value: s.clone(),
            })?,
            Err(_) => ZeroDurationPolicy::default(),
        };

        Ok(Self {
            data_dir: env::var("VITALS_DATA_DIR")
                .unwrap_or_else(|_| "data/records".to_string())
                .into(),

            db_path: env::var("VITALS_DB_PATH")
                .unwrap_or_else(|_| "data/vitals.db".to_string())
                .into(),

            alerts_output_path: env::var("ALERTS_OUTPUT_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),

            evaluation_interval_secs: env::var("EVALUATION_INTERVAL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(60),

            lookback_mins: env::var("EVALUATION_LOOKBACK_MINS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|mins| *mins >= 0)
                .unwrap_or(0),

            ecg_variance_multiplier,
            zero_duration_policy,
        })
    }

    /// Evaluation window ending at `now_ms`
    pub fn window_ending_at(&self, now_ms: i64) -> (i64, i64) {
        if self.lookback_mins == 0 {
            return (crate::records::ALL_TIME_START, crate::records::ALL_TIME_END);
        }
        (now_ms.saturating_sub(self.lookback_mins.saturating_mul(60_000)), now_ms)
    }
}
