//! vitalwatch - patient vital-sign alert detection and correlation
//!
//! ```text
//! records   → MeasurementRecord sources (memory, files, SQLite)
//! detectors → per-signal candidate alerts
//! evaluation→ correlate, deduplicate, deliver
//! alerts    → Alert model and notifiers
//! ```

pub mod alerts;
pub mod config;
pub mod detectors;
pub mod evaluation;
pub mod records;
