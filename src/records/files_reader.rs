//! Directory and JSONL ingestion into an [`InMemoryRecordStore`]
//!
//! The data generator writes one text file per signal label (`Saturation.txt`,
//! `ECG.txt`, ...) with lines of the form:
//!
//! ```text
//! Patient ID: 1, Timestamp: 1714376789050, Label: Saturation, Data: 97%
//! ```
//!
//! Staff alerts live in `Alert.txt` with `Data: triggered` or `Data: resolved`.

use super::source::{InMemoryRecordStore, SourceError};
use super::types::{MeasurementRecord, SignalType};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ReaderError {
    Io(std::io::Error),
    NotADirectory(PathBuf),
    Store(SourceError),
}

impl From<std::io::Error> for ReaderError {
    fn from(err: std::io::Error) -> Self {
        ReaderError::Io(err)
    }
}

impl From<SourceError> for ReaderError {
    fn from(err: SourceError) -> Self {
        ReaderError::Store(err)
    }
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderError::Io(e) => write!(f, "IO error: {}", e),
            ReaderError::NotADirectory(p) => write!(f, "Not a directory: {}", p.display()),
            ReaderError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for ReaderError {}

/// Counts from one ingestion run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadSummary {
    pub records: usize,
    pub skipped: usize,
}

impl ReadSummary {
    fn merge(&mut self, other: ReadSummary) {
        self.records += other.records;
        self.skipped += other.skipped;
    }
}

pub struct FilesReader {
    base_dir: PathBuf,
}

impl FilesReader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Read every known `<Label>.txt` file and any `*.jsonl` file in the base directory
    pub fn read_into(&self, store: &InMemoryRecordStore) -> Result<ReadSummary, ReaderError> {
        if !self.base_dir.is_dir() {
            return Err(ReaderError::NotADirectory(self.base_dir.clone()));
        }

        let mut summary = ReadSummary::default();

        for signal in SignalType::all() {
            let path = self.base_dir.join(format!("{}.txt", signal.as_str()));
            if path.is_file() {
                summary.merge(read_text_file(&path, store)?);
            }
        }

        let mut jsonl_files: Vec<PathBuf> = std::fs::read_dir(&self.base_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().map_or(false, |ext| ext == "jsonl"))
            .collect();
        jsonl_files.sort();

        for path in jsonl_files {
            summary.merge(read_jsonl_file(&path, store)?);
        }

        log::info!(
            "📥 Loaded {} records from {} ({} lines skipped)",
            summary.records,
            self.base_dir.display(),
            summary.skipped
        );
        Ok(summary)
    }
}

/// Read one generator text file
pub fn read_text_file(path: &Path, store: &InMemoryRecordStore) -> Result<ReadSummary, ReaderError> {
    let reader = BufReader::new(File::open(path)?);
    let mut summary = ReadSummary::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match parse_text_line(&line) {
            Some(record) => {
                store.add_record(record)?;
                summary.records += 1;
            }
            None => {
                log::warn!("Skipping malformed line in {}: {}", path.display(), line);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

/// Read one JSONL file of serialized [`MeasurementRecord`]s
pub fn read_jsonl_file(path: &Path, store: &InMemoryRecordStore) -> Result<ReadSummary, ReaderError> {
    let reader = BufReader::new(File::open(path)?);
    let mut summary = ReadSummary::default();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match MeasurementRecord::from_jsonl(line) {
            Ok(record) => {
                store.add_record(record)?;
                summary.records += 1;
            }
            Err(e) => {
                log::warn!("Skipping JSONL line in {}: {}", path.display(), e);
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

/// Parse `Patient ID: <id>, Timestamp: <ms>, Label: <label>, Data: <value>`
pub fn parse_text_line(line: &str) -> Option<MeasurementRecord> {
    let parts: Vec<&str> = line.trim().split(", ").collect();
    if parts.len() != 4 {
        return None;
    }

    let patient_id = field_value(parts[0], "Patient ID")?;
    let timestamp: i64 = field_value(parts[1], "Timestamp")?.parse().ok()?;
    let label = field_value(parts[2], "Label")?;
    let data = field_value(parts[3], "Data")?;

    let Some(signal_type) = SignalType::from_label(label) else {
        log::debug!("Ignoring unrecognized signal label: {}", label);
        return None;
    };

    let value = match signal_type {
        SignalType::Saturation => data.trim_end_matches('%').parse().ok()?,
        SignalType::StaffAlert => {
            if data == "triggered" {
                1.0
            } else {
                0.0
            }
        }
        _ => data.parse().ok()?,
    };

    Some(MeasurementRecord::new(patient_id, signal_type, value, timestamp))
}

fn field_value<'a>(part: &'a str, key: &str) -> Option<&'a str> {
    let (k, v) = part.split_once(": ")?;
    if k.trim() == key {
        Some(v.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::source::{RecordSource, ALL_TIME_END, ALL_TIME_START};
    use std::io::Write;

    #[test]
    fn test_parse_saturation_line() {
        let record =
            parse_text_line("Patient ID: 12, Timestamp: 1714376789050, Label: Saturation, Data: 94%")
                .unwrap();
        assert_eq!(record.patient_id, "12");
        assert_eq!(record.signal_type, SignalType::Saturation);
        assert_eq!(record.value, 94.0);
        assert_eq!(record.timestamp, 1714376789050);
    }

    #[test]
    fn test_parse_staff_alert_lines() {
        let triggered =
            parse_text_line("Patient ID: 3, Timestamp: 10, Label: Alert, Data: triggered").unwrap();
        assert_eq!(triggered.signal_type, SignalType::StaffAlert);
        assert_eq!(triggered.value, 1.0);

        let resolved =
            parse_text_line("Patient ID: 3, Timestamp: 11, Label: Alert, Data: resolved").unwrap();
        assert_eq!(resolved.value, 0.0);
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(parse_text_line("Patient ID: 3, Timestamp: 10, Label: ECG").is_none());
        assert!(parse_text_line("Patient ID: 3, Timestamp: soon, Label: ECG, Data: 0.1").is_none());
        assert!(parse_text_line("Patient ID: 3, Timestamp: 10, Label: Glucose, Data: 5.1").is_none());
        assert!(parse_text_line("Patient ID: 3, Timestamp: 10, Label: ECG, Data: abc").is_none());
    }

    #[test]
    fn test_read_directory() {
        let dir = tempfile::tempdir().unwrap();

        let mut sat = File::create(dir.path().join("Saturation.txt")).unwrap();
        writeln!(sat, "Patient ID: 1, Timestamp: 100, Label: Saturation, Data: 97%").unwrap();
        writeln!(sat, "Patient ID: 1, Timestamp: 200, Label: Saturation, Data: 91%").unwrap();
        writeln!(sat, "garbage").unwrap();

        let mut ecg = File::create(dir.path().join("ECG.txt")).unwrap();
        writeln!(ecg, "Patient ID: 2, Timestamp: 100, Label: ECG, Data: 0.18144082417659804").unwrap();

        let mut jsonl = File::create(dir.path().join("extra.jsonl")).unwrap();
        writeln!(
            jsonl,
            r#"{{"patient_id":"2","signal_type":"SystolicPressure","value":121.0,"timestamp":300}}"#
        )
        .unwrap();

        // Not a known label file, ignored entirely
        let mut other = File::create(dir.path().join("Notes.txt")).unwrap();
        writeln!(other, "Patient ID: 1, Timestamp: 1, Label: ECG, Data: 0.5").unwrap();

        let store = InMemoryRecordStore::new();
        let summary = FilesReader::new(dir.path()).read_into(&store).unwrap();

        assert_eq!(summary, ReadSummary { records: 4, skipped: 1 });
        assert_eq!(
            store.records_of("1", ALL_TIME_START, ALL_TIME_END).unwrap().unwrap().len(),
            2
        );
        assert_eq!(
            store.records_of("2", ALL_TIME_START, ALL_TIME_END).unwrap().unwrap().len(),
            2
        );
    }

    #[test]
    fn test_missing_directory() {
        let store = InMemoryRecordStore::new();
        let result = FilesReader::new("/definitely/not/here").read_into(&store);
        assert!(matches!(result, Err(ReaderError::NotADirectory(_))));
    }
}
