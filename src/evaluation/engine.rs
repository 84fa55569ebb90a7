//! Per-patient evaluation pass
//!
//! One pass moves through `Idle → Loading → Detecting → Correlating → Deduplicating →
//! Delivered`. A blank or unknown patient, or a failing record source, ends the pass in
//! `Rejected` with no alerts. Every pass builds fresh collections, so one evaluator can
//! serve passes for different patients on different threads.

use super::correlator::{correlate, CompoundRule};
use super::dedup::deduplicate;
use crate::alerts::{Alert, AlertNotifier};
use crate::detectors::{default_detectors, Detector, EcgDetector};
use crate::records::{RecordSource, ALL_TIME_END, ALL_TIME_START};
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationState {
    Idle,
    Loading,
    Detecting,
    Correlating,
    Deduplicating,
    Delivered,
    Rejected,
}

impl EvaluationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationState::Idle => "idle",
            EvaluationState::Loading => "loading",
            EvaluationState::Detecting => "detecting",
            EvaluationState::Correlating => "correlating",
            EvaluationState::Deduplicating => "deduplicating",
            EvaluationState::Delivered => "delivered",
            EvaluationState::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EvaluationState::Delivered | EvaluationState::Rejected)
    }
}

impl fmt::Display for EvaluationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one pass
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    pub patient_id: String,
    pub state: EvaluationState,
    /// Alerts handed to the notifiers (empty when rejected)
    pub alerts: Vec<Alert>,
    pub records_scanned: usize,
    /// Notifier deliveries that failed and were dropped
    pub failed_deliveries: usize,
}

impl EvaluationReport {
    fn rejected(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            state: EvaluationState::Rejected,
            alerts: Vec::new(),
            records_scanned: 0,
            failed_deliveries: 0,
        }
    }
}

/// Tracks the current stage of a pass and logs every transition
struct PassState<'a> {
    patient_id: &'a str,
    state: EvaluationState,
}

impl<'a> PassState<'a> {
    fn new(patient_id: &'a str) -> Self {
        Self {
            patient_id,
            state: EvaluationState::Idle,
        }
    }

    fn advance(&mut self, next: EvaluationState) {
        log::debug!("patient {}: {} → {}", self.patient_id, self.state, next);
        self.state = next;
    }
}

pub struct AlertEvaluator {
    source: Arc<dyn RecordSource>,
    detectors: Vec<Box<dyn Detector>>,
    compound_rules: Vec<CompoundRule>,
    notifiers: Vec<Box<dyn AlertNotifier>>,
}

impl AlertEvaluator {
    /// Evaluator with the standard detectors and the hypotensive hypoxemia rule.
    /// Notifiers are added with [`AlertEvaluator::with_notifier`].
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self::with_detectors(source, default_detectors(EcgDetector::with_defaults()))
    }

    pub fn with_detectors(source: Arc<dyn RecordSource>, detectors: Vec<Box<dyn Detector>>) -> Self {
        Self {
            source,
            detectors,
            compound_rules: vec![CompoundRule::hypotensive_hypoxemia()],
            notifiers: Vec::new(),
        }
    }

    pub fn with_notifier(mut self, notifier: impl AlertNotifier + 'static) -> Self {
        self.notifiers.push(Box::new(notifier));
        self
    }

    pub fn with_compound_rules(mut self, rules: Vec<CompoundRule>) -> Self {
        self.compound_rules = rules;
        self
    }

    pub fn notifier_types(&self) -> Vec<&'static str> {
        self.notifiers.iter().map(|n| n.notifier_type()).collect()
    }

    /// Evaluate the patient's whole history and return the delivered alerts
    pub fn evaluate(&self, patient_id: &str) -> Vec<Alert> {
        self.run_pass(patient_id, ALL_TIME_START, ALL_TIME_END).alerts
    }

    /// Evaluate records with `start <= timestamp <= end`
    pub fn run_pass(&self, patient_id: &str, start: i64, end: i64) -> EvaluationReport {
        let mut pass = PassState::new(patient_id);

        if patient_id.trim().is_empty() {
            log::warn!("Rejected evaluation: blank patient id");
            pass.advance(EvaluationState::Rejected);
            return EvaluationReport::rejected(patient_id);
        }

        pass.advance(EvaluationState::Loading);
        let records = match self.source.records_of(patient_id, start, end) {
            Ok(Some(records)) => records,
            Ok(None) => {
                log::warn!("Rejected evaluation: unknown patient {}", patient_id);
                pass.advance(EvaluationState::Rejected);
                return EvaluationReport::rejected(patient_id);
            }
            Err(e) => {
                log::error!("Failed to load records for patient {}: {}", patient_id, e);
                pass.advance(EvaluationState::Rejected);
                return EvaluationReport::rejected(patient_id);
            }
        };

        pass.advance(EvaluationState::Detecting);
        let mut candidates = Vec::new();
        for detector in &self.detectors {
            let found = detector.detect(patient_id, &records);
            if !found.is_empty() {
                log::debug!(
                    "patient {}: {} produced {} candidate(s)",
                    patient_id,
                    detector.name(),
                    found.len()
                );
            }
            candidates.extend(found);
        }

        pass.advance(EvaluationState::Correlating);
        let correlated = self
            .compound_rules
            .iter()
            .fold(candidates, |alerts, rule| correlate(alerts, rule));

        pass.advance(EvaluationState::Deduplicating);
        let alerts = deduplicate(correlated);

        let failed_deliveries = self.deliver(&alerts);
        pass.advance(EvaluationState::Delivered);

        EvaluationReport {
            patient_id: patient_id.to_string(),
            state: pass.state,
            alerts,
            records_scanned: records.len(),
            failed_deliveries,
        }
    }

    /// Hand every alert to every notifier; failures are logged and counted, never retried
    fn deliver(&self, alerts: &[Alert]) -> usize {
        let mut failed = 0;
        for alert in alerts {
            for notifier in &self.notifiers {
                if let Err(e) = notifier.deliver(alert) {
                    log::warn!(
                        "{} notifier dropped alert for patient {}: {}",
                        notifier.notifier_type(),
                        alert.patient_id,
                        e
                    );
                    failed += 1;
                }
            }
        }
        failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::alert::{DIASTOLIC_CRITICAL, STAFF_TRIGGERED};
    use crate::alerts::{MemoryNotifier, NotifyError};
    use crate::records::{InMemoryRecordStore, MeasurementRecord, SignalType, SourceError};

    struct FailingSource;

    impl RecordSource for FailingSource {
        fn records_of(
            &self,
            _patient_id: &str,
            _start: i64,
            _end: i64,
        ) -> Result<Option<Vec<MeasurementRecord>>, SourceError> {
            Err(SourceError::Poisoned("test".to_string()))
        }

        fn patient_ids(&self) -> Result<Vec<String>, SourceError> {
            Ok(Vec::new())
        }
    }

    struct FailingNotifier;

    impl AlertNotifier for FailingNotifier {
        fn deliver(&self, _alert: &Alert) -> Result<(), NotifyError> {
            Err(NotifyError::ChannelClosed)
        }

        fn notifier_type(&self) -> &'static str {
            "failing"
        }
    }

    fn store_with(records: &[(&str, SignalType, f64, i64)]) -> Arc<InMemoryRecordStore> {
        let store = InMemoryRecordStore::new();
        for (pid, signal, value, ts) in records {
            store.add_measurement(*pid, *value, *signal, *ts).unwrap();
        }
        Arc::new(store)
    }

    #[test]
    fn test_blank_patient_rejected() {
        let evaluator = AlertEvaluator::new(store_with(&[]));

        let report = evaluator.run_pass("  ", ALL_TIME_START, ALL_TIME_END);
        assert_eq!(report.state, EvaluationState::Rejected);
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_unknown_patient_rejected() {
        let store = store_with(&[("1", SignalType::DiastolicPressure, 59.0, 10)]);
        let evaluator = AlertEvaluator::new(store);

        let report = evaluator.run_pass("2", ALL_TIME_START, ALL_TIME_END);
        assert_eq!(report.state, EvaluationState::Rejected);
        assert!(evaluator.evaluate("2").is_empty());
    }

    #[test]
    fn test_source_error_rejected() {
        let evaluator = AlertEvaluator::new(Arc::new(FailingSource));

        let report = evaluator.run_pass("1", ALL_TIME_START, ALL_TIME_END);
        assert_eq!(report.state, EvaluationState::Rejected);
        assert!(report.state.is_terminal());
    }

    #[test]
    fn test_delivered_pass_reports_scan() {
        let store = store_with(&[
            ("1", SignalType::DiastolicPressure, 59.0, 10),
            ("1", SignalType::Cholesterol, 200.0, 11),
        ]);
        let notifier = Arc::new(MemoryNotifier::new());
        let evaluator = AlertEvaluator::new(store).with_notifier(notifier.clone());

        let report = evaluator.run_pass("1", ALL_TIME_START, ALL_TIME_END);
        assert_eq!(report.state, EvaluationState::Delivered);
        assert_eq!(report.records_scanned, 2);
        assert_eq!(report.alerts, vec![Alert::new("1", DIASTOLIC_CRITICAL, 10)]);
        assert_eq!(notifier.delivered(), report.alerts);
    }

    #[test]
    fn test_window_limits_records() {
        let store = store_with(&[
            ("1", SignalType::DiastolicPressure, 59.0, 10),
            ("1", SignalType::DiastolicPressure, 80.0, 100),
        ]);
        let evaluator = AlertEvaluator::new(store);

        let report = evaluator.run_pass("1", 50, 200);
        assert_eq!(report.state, EvaluationState::Delivered);
        assert_eq!(report.records_scanned, 1);
        assert!(report.alerts.is_empty());
    }

    #[test]
    fn test_notifier_failure_is_swallowed() {
        let store = store_with(&[("1", SignalType::StaffAlert, 1.0, 5)]);
        let memory = Arc::new(MemoryNotifier::new());
        let evaluator = AlertEvaluator::new(store)
            .with_notifier(FailingNotifier)
            .with_notifier(memory.clone());

        let report = evaluator.run_pass("1", ALL_TIME_START, ALL_TIME_END);
        assert_eq!(report.state, EvaluationState::Delivered);
        assert_eq!(report.failed_deliveries, 1);
        assert_eq!(memory.delivered(), vec![Alert::high_priority("1", STAFF_TRIGGERED, 5)]);
        assert_eq!(evaluator.notifier_types(), vec!["failing", "memory"]);
    }

    #[test]
    fn test_no_compound_rules_leaves_pairs() {
        let store = store_with(&[
            ("1", SignalType::Saturation, 89.0, 10),
            ("1", SignalType::SystolicPressure, 89.0, 10),
        ]);
        let evaluator = AlertEvaluator::new(store).with_compound_rules(Vec::new());

        assert_eq!(evaluator.evaluate("1").len(), 2);
    }
}
