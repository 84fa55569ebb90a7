//! Evaluation pipeline
//!
//! ```text
//! RecordSource::records_of(patient, start, end)
//!     ↓
//! Detectors (staff, blood pressure, saturation, ECG)
//!     ↓
//! correlate (compound rules → high-priority composites)
//!     ↓
//! deduplicate (first alert per condition)
//!     ↓
//! AlertNotifier::deliver
//! ```

pub mod correlator;
pub mod dedup;
pub mod engine;

pub use correlator::{correlate, CompoundRule};
pub use dedup::deduplicate;
pub use engine::{AlertEvaluator, EvaluationReport, EvaluationState};
