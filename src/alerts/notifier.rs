//! Alert delivery backends
//!
//! The evaluator hands every surviving alert to each configured [`AlertNotifier`].
//! Delivery is fire-and-forget: a failing notifier is logged by the caller and never
//! changes the result of an evaluation pass.

use super::alert::Alert;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

#[derive(Debug)]
pub enum NotifyError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    ChannelFull,
    ChannelClosed,
    Poisoned,
}

impl From<std::io::Error> for NotifyError {
    fn from(err: std::io::Error) -> Self {
        NotifyError::Io(err)
    }
}

impl From<serde_json::Error> for NotifyError {
    fn from(err: serde_json::Error) -> Self {
        NotifyError::Serialization(err)
    }
}

impl std::fmt::Display for NotifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotifyError::Io(e) => write!(f, "IO error: {}", e),
            NotifyError::Serialization(e) => write!(f, "Serialization error: {}", e),
            NotifyError::ChannelFull => write!(f, "Alert channel is full"),
            NotifyError::ChannelClosed => write!(f, "Alert channel is closed"),
            NotifyError::Poisoned => write!(f, "Notifier lock poisoned"),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Delivery callback for surviving alerts
pub trait AlertNotifier: Send + Sync {
    /// Deliver one alert. Expected to be fast and non-blocking.
    fn deliver(&self, alert: &Alert) -> Result<(), NotifyError>;

    /// Notifier type for logging
    fn notifier_type(&self) -> &'static str;
}

/// Writes alerts through the `log` facade
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl AlertNotifier for LogNotifier {
    fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        if alert.is_high_priority() {
            log::error!("🚨 {}", alert);
        } else {
            log::warn!("⚠️  {}", alert);
        }
        Ok(())
    }

    fn notifier_type(&self) -> &'static str {
        "log"
    }
}

/// Appends one JSON object per alert to a file
pub struct JsonlAlertWriter {
    inner: Mutex<JsonlState>,
}

struct JsonlState {
    writer: BufWriter<File>,
    last_flush: Instant,
}

impl JsonlAlertWriter {
    const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

    pub fn new(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        log::info!("📝 Writing alerts to: {}", path.display());

        Ok(Self {
            inner: Mutex::new(JsonlState {
                writer: BufWriter::new(file),
                last_flush: Instant::now(),
            }),
        })
    }
}

impl AlertNotifier for JsonlAlertWriter {
    fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        let json = serde_json::to_string(alert)?;
        let mut state = self.inner.lock().map_err(|_| NotifyError::Poisoned)?;
        writeln!(state.writer, "{}", json)?;

        if state.last_flush.elapsed() > Self::FLUSH_INTERVAL {
            state.writer.flush()?;
            state.last_flush = Instant::now();
        }
        Ok(())
    }

    fn notifier_type(&self) -> &'static str {
        "jsonl"
    }
}

impl Drop for JsonlAlertWriter {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

/// Forwards alerts into a bounded tokio channel without blocking
pub struct ChannelNotifier {
    tx: mpsc::Sender<Alert>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<Alert>) -> Self {
        Self { tx }
    }
}

impl AlertNotifier for ChannelNotifier {
    fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.tx.try_send(alert.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => NotifyError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => NotifyError::ChannelClosed,
        })
    }

    fn notifier_type(&self) -> &'static str {
        "channel"
    }
}

/// Keeps every delivered alert in memory
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    delivered: Mutex<Vec<Alert>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<Alert> {
        self.delivered
            .lock()
            .map(|alerts| alerts.clone())
            .unwrap_or_default()
    }
}

impl AlertNotifier for MemoryNotifier {
    fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        self.delivered
            .lock()
            .map_err(|_| NotifyError::Poisoned)?
            .push(alert.clone());
        Ok(())
    }

    fn notifier_type(&self) -> &'static str {
        "memory"
    }
}

impl<T: AlertNotifier + ?Sized> AlertNotifier for std::sync::Arc<T> {
    fn deliver(&self, alert: &Alert) -> Result<(), NotifyError> {
        (**self).deliver(alert)
    }

    fn notifier_type(&self) -> &'static str {
        (**self).notifier_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::alert::{HYPOTENSIVE_HYPOXEMIA, LOW_SATURATION};

    #[test]
    fn test_jsonl_writer_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alerts").join("alerts.jsonl");

        {
            let writer = JsonlAlertWriter::new(&path).unwrap();
            writer.deliver(&Alert::new("1", LOW_SATURATION, 10)).unwrap();
            writer
                .deliver(&Alert::high_priority("1", HYPOTENSIVE_HYPOXEMIA, 10))
                .unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let alerts: Vec<Alert> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[1].condition, HYPOTENSIVE_HYPOXEMIA);
        assert!(alerts[1].is_high_priority());
    }

    #[test]
    fn test_channel_notifier_reports_full_and_closed() {
        let (tx, rx) = mpsc::channel::<Alert>(1);
        let notifier = ChannelNotifier::new(tx);

        assert!(notifier.deliver(&Alert::new("1", LOW_SATURATION, 1)).is_ok());
        assert!(matches!(
            notifier.deliver(&Alert::new("1", LOW_SATURATION, 2)),
            Err(NotifyError::ChannelFull)
        ));

        drop(rx);
        assert!(matches!(
            notifier.deliver(&Alert::new("1", LOW_SATURATION, 3)),
            Err(NotifyError::ChannelClosed)
        ));
    }

    #[test]
    fn test_memory_notifier_collects() {
        let notifier = MemoryNotifier::new();
        notifier.deliver(&Alert::new("1", LOW_SATURATION, 1)).unwrap();
        assert_eq!(notifier.delivered().len(), 1);
        assert_eq!(LogNotifier::new().notifier_type(), "log");
    }
}
