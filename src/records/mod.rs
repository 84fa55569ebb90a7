//! Measurement records and the sources that serve them
//!
//! ```text
//! <Label>.txt / *.jsonl → FilesReader → InMemoryRecordStore ┐
//!                                                           ├→ RecordSource → AlertEvaluator
//! measurements table    → SqliteRecordSource ───────────────┘
//! ```

pub mod files_reader;
pub mod source;
pub mod sqlite_source;
pub mod types;

pub use files_reader::{FilesReader, ReadSummary, ReaderError};
pub use source::{InMemoryRecordStore, RecordSource, SourceError, ALL_TIME_END, ALL_TIME_START};
pub use sqlite_source::SqliteRecordSource;
pub use types::{MeasurementRecord, SignalType};
