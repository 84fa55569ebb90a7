//! Record source contract and the in-memory store
//!
//! The evaluation engine only ever sees patients through [`RecordSource`]. Any storage
//! layer that can answer "records of patient X between two timestamps" can back it.

use super::types::{MeasurementRecord, SignalType};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

/// Start of the "entire history" query range
pub const ALL_TIME_START: i64 = 0;
/// End of the "entire history" query range
pub const ALL_TIME_END: i64 = i64::MAX;

#[derive(Debug)]
pub enum SourceError {
    Database(rusqlite::Error),
    Poisoned(String),
}

impl From<rusqlite::Error> for SourceError {
    fn from(err: rusqlite::Error) -> Self {
        SourceError::Database(err)
    }
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Database(e) => write!(f, "Database error: {}", e),
            SourceError::Poisoned(what) => write!(f, "Lock poisoned: {}", what),
        }
    }
}

impl std::error::Error for SourceError {}

/// Query capability over stored measurements
///
/// Implementations must be safe for concurrent reads: passes for different patients
/// may run on different threads against the same source.
pub trait RecordSource: Send + Sync {
    /// All records of `patient_id` with `start <= timestamp <= end`, in no particular order.
    ///
    /// Returns `Ok(None)` when the patient is unknown to the source.
    fn records_of(
        &self,
        patient_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Option<Vec<MeasurementRecord>>, SourceError>;

    /// Identifiers of every patient the source knows about
    fn patient_ids(&self) -> Result<Vec<String>, SourceError>;
}

/// Thread-safe in-memory record store keyed by patient and ordered by timestamp
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    patients: RwLock<HashMap<String, BTreeMap<i64, Vec<MeasurementRecord>>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&self, record: MeasurementRecord) -> Result<(), SourceError> {
        let mut patients = self
            .patients
            .write()
            .map_err(|_| SourceError::Poisoned("record store".to_string()))?;

        patients
            .entry(record.patient_id.clone())
            .or_default()
            .entry(record.timestamp)
            .or_default()
            .push(record);
        Ok(())
    }

    pub fn add_measurement(
        &self,
        patient_id: &str,
        value: f64,
        signal_type: SignalType,
        timestamp: i64,
    ) -> Result<(), SourceError> {
        self.add_record(MeasurementRecord::new(patient_id, signal_type, value, timestamp))
    }

    /// Total number of stored records across all patients
    pub fn len(&self) -> usize {
        self.patients
            .read()
            .map(|p| p.values().flat_map(|by_ts| by_ts.values()).map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RecordSource for InMemoryRecordStore {
    fn records_of(
        &self,
        patient_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Option<Vec<MeasurementRecord>>, SourceError> {
        let patients = self
            .patients
            .read()
            .map_err(|_| SourceError::Poisoned("record store".to_string()))?;

        let Some(by_timestamp) = patients.get(patient_id) else {
            return Ok(None);
        };

        if start > end {
            return Ok(Some(Vec::new()));
        }

        let records = by_timestamp
            .range(start..=end)
            .flat_map(|(_, records)| records.iter().cloned())
            .collect();
        Ok(Some(records))
    }

    fn patient_ids(&self) -> Result<Vec<String>, SourceError> {
        let patients = self
            .patients
            .read()
            .map_err(|_| SourceError::Poisoned("record store".to_string()))?;

        let mut ids: Vec<String> = patients.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_patient_is_none() {
        let store = InMemoryRecordStore::new();
        store.add_measurement("1", 97.0, SignalType::Saturation, 100).unwrap();

        assert!(store.records_of("2", ALL_TIME_START, ALL_TIME_END).unwrap().is_none());
    }

    #[test]
    fn test_range_query_is_inclusive() {
        let store = InMemoryRecordStore::new();
        for ts in [100, 200, 300, 400] {
            store.add_measurement("1", 97.0, SignalType::Saturation, ts).unwrap();
        }

        let records = store.records_of("1", 200, 300).unwrap().unwrap();
        let timestamps: Vec<i64> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![200, 300]);
    }

    #[test]
    fn test_all_time_range_and_duplicate_timestamps() {
        let store = InMemoryRecordStore::new();
        store.add_measurement("1", 120.0, SignalType::SystolicPressure, 0).unwrap();
        store.add_measurement("1", 80.0, SignalType::DiastolicPressure, 0).unwrap();
        store.add_measurement("1", 0.3, SignalType::Ecg, i64::MAX).unwrap();

        let records = store.records_of("1", ALL_TIME_START, ALL_TIME_END).unwrap().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_inverted_range_is_empty_not_error() {
        let store = InMemoryRecordStore::new();
        store.add_measurement("1", 97.0, SignalType::Saturation, 100).unwrap();

        let records = store.records_of("1", 500, 100).unwrap().unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_patient_ids_sorted() {
        let store = InMemoryRecordStore::new();
        store.add_measurement("b", 97.0, SignalType::Saturation, 1).unwrap();
        store.add_measurement("a", 97.0, SignalType::Saturation, 1).unwrap();

        assert_eq!(store.patient_ids().unwrap(), vec!["a".to_string(), "b".to_string()]);
    }
}
