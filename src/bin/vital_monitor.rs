//! Vital Monitor - periodic alert evaluation for every known patient
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin vital_monitor
//! cargo run --release --bin vital_monitor -- --source sqlite
//! ```
//!
//! ## Environment Variables
//!
//! - VITALS_DATA_DIR - Directory of <Label>.txt / *.jsonl record files (default: data/records) - used when --source files
//! - VITALS_DB_PATH - SQLite database path (default: data/vitals.db) - used when --source sqlite
//! - ALERTS_OUTPUT_PATH - JSONL file for delivered alerts (optional)
//! - EVALUATION_INTERVAL_SECS - How often every patient is evaluated (default: 60)
//! - EVALUATION_LOOKBACK_MINS - Records considered per pass, 0 for whole history (default: 0)
//! - ECG_VARIANCE_MULTIPLIER - Irregular beat sensitivity (default: 3.6)
//! - ZERO_DURATION_BPM_POLICY - suppress | fire (default: suppress)
//! - RUST_LOG - Logging level (optional, default: info)

use chrono::Utc;
use std::env;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use vitalwatch::alerts::{JsonlAlertWriter, LogNotifier};
use vitalwatch::config::{parse_source_from_args, MonitorConfig, SourceKind};
use vitalwatch::detectors::{default_detectors, EcgDetector};
use vitalwatch::evaluation::{AlertEvaluator, EvaluationState};
use vitalwatch::records::{FilesReader, InMemoryRecordStore, RecordSource, SqliteRecordSource};

fn open_source(
    kind: SourceKind,
    config: &MonitorConfig,
) -> Result<Arc<dyn RecordSource>, Box<dyn std::error::Error>> {
    match kind {
        SourceKind::Files => {
            let store = InMemoryRecordStore::new();
            FilesReader::new(config.data_dir.clone()).read_into(&store)?;
            Ok(Arc::new(store))
        }
        SourceKind::Sqlite => {
            Ok(Arc::new(SqliteRecordSource::open(&config.db_path)?))
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    dotenv::dotenv().ok();

    let args: Vec<String> = env::args().collect();
    let source_kind = parse_source_from_args(&args);
    let config = MonitorConfig::from_env()?;

    log::info!("🚀 Starting Vital Monitor");
    log::info!("   Source: {}", source_kind.as_str());
    log::info!("   Evaluation interval: {}s", config.evaluation_interval_secs);
    if config.lookback_mins == 0 {
        log::info!("   Lookback: whole history");
    } else {
        log::info!("   Lookback: {}m", config.lookback_mins);
    }
    log::info!("   ECG variance multiplier: {}", config.ecg_variance_multiplier);
    log::info!("   Zero-duration BPM policy: {}", config.zero_duration_policy.as_str());

    let source = open_source(source_kind, &config)?;

    let ecg = EcgDetector::new(config.ecg_variance_multiplier, config.zero_duration_policy);
    let mut evaluator = AlertEvaluator::with_detectors(source.clone(), default_detectors(ecg))
        .with_notifier(LogNotifier::new());
    if let Some(path) = &config.alerts_output_path {
        evaluator = evaluator.with_notifier(JsonlAlertWriter::new(path)?);
        log::info!("   Alert output: {}", path.display());
    }
    let evaluator = Arc::new(evaluator);

    log::info!("📊 Notifiers: {}", evaluator.notifier_types().join(", "));

    let mut ticker = interval(Duration::from_secs(config.evaluation_interval_secs));

    log::info!("✅ Vital Monitor running - evaluating patients...");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let patient_ids = match source.patient_ids() {
                    Ok(ids) => ids,
                    Err(e) => {
                        log::error!("Failed to list patients: {}", e);
                        continue;
                    }
                };

                let (start, end) = config.window_ending_at(Utc::now().timestamp_millis());
                log::info!("⏱️  Evaluating {} patients...", patient_ids.len());

                let mut passes = Vec::with_capacity(patient_ids.len());
                for patient_id in patient_ids {
                    let evaluator = Arc::clone(&evaluator);
                    passes.push(tokio::task::spawn_blocking(move || {
                        evaluator.run_pass(&patient_id, start, end)
                    }));
                }

                let mut alerts_count = 0;
                let mut rejected_count = 0;
                for pass in passes {
                    match pass.await {
                        Ok(report) => {
                            if report.state == EvaluationState::Rejected {
                                rejected_count += 1;
                            }
                            alerts_count += report.alerts.len();
                        }
                        Err(e) => log::error!("Evaluation task failed: {}", e),
                    }
                }

                log::info!(
                    "✅ Delivered {} alerts ({} passes rejected)",
                    alerts_count,
                    rejected_count
                );
            }

            _ = tokio::signal::ctrl_c() => {
                log::info!("🛑 Shutting down Vital Monitor");
                break;
            }
        }
    }

    Ok(())
}
