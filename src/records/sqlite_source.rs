//! SQLite-backed record source
//!
//! Measurements live in a single `measurements` table indexed by
//! `(patient_id, timestamp)`, so a per-patient range query is one index scan.

use super::source::{RecordSource, SourceError};
use super::types::{MeasurementRecord, SignalType};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS measurements (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        patient_id  TEXT    NOT NULL,
        signal_type TEXT    NOT NULL,
        value       REAL    NOT NULL,
        timestamp   INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_measurements_patient_ts
        ON measurements (patient_id, timestamp);
";

pub struct SqliteRecordSource {
    conn: Mutex<Connection>,
}

impl SqliteRecordSource {
    /// Open (or create) a database file and ensure the schema exists
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let conn = Connection::open(db_path.as_ref())?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch(SCHEMA)?;

        log::info!("📂 SQLite record source opened: {}", db_path.as_ref().display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, SourceError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn insert(&self, record: &MeasurementRecord) -> Result<(), SourceError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO measurements (patient_id, signal_type, value, timestamp)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.patient_id,
                record.signal_type.as_str(),
                record.value,
                record.timestamp
            ],
        )?;
        Ok(())
    }

    /// Insert many records in one transaction
    pub fn insert_batch(&self, records: &[MeasurementRecord]) -> Result<usize, SourceError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO measurements (patient_id, signal_type, value, timestamp)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.patient_id,
                    record.signal_type.as_str(),
                    record.value,
                    record.timestamp
                ])?;
            }
        }
        tx.commit()?;
        log::debug!("Inserted {} measurements", records.len());
        Ok(records.len())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, SourceError> {
        self.conn
            .lock()
            .map_err(|_| SourceError::Poisoned("sqlite connection".to_string()))
    }
}

impl RecordSource for SqliteRecordSource {
    fn records_of(
        &self,
        patient_id: &str,
        start: i64,
        end: i64,
    ) -> Result<Option<Vec<MeasurementRecord>>, SourceError> {
        let conn = self.lock()?;

        let known: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM measurements WHERE patient_id = ?1)",
            [patient_id],
            |row| row.get(0),
        )?;
        if !known {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT patient_id, signal_type, value, timestamp
             FROM measurements
             WHERE patient_id = ?1 AND timestamp BETWEEN ?2 AND ?3
             ORDER BY timestamp ASC, id ASC",
        )?;

        let rows = stmt.query_map(params![patient_id, start, end], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (patient_id, label, value, timestamp) = row?;
            match SignalType::from_label(&label) {
                Some(signal_type) => {
                    records.push(MeasurementRecord::new(patient_id, signal_type, value, timestamp))
                }
                None => log::debug!("Ignoring row with unrecognized signal type: {}", label),
            }
        }

        Ok(Some(records))
    }

    fn patient_ids(&self) -> Result<Vec<String>, SourceError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT patient_id FROM measurements ORDER BY patient_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}
