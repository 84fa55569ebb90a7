//! Compound correlation: two single-signal alerts close in time become one composite

use crate::alerts::alert::{HYPOTENSIVE_HYPOXEMIA, LOW_SATURATION, SYSTOLIC_CRITICAL};
use crate::alerts::Alert;

/// Hypotensive hypoxemia window: 0.1 minute
pub const HYPOTENSIVE_HYPOXEMIA_WINDOW_MS: i64 = 6_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundRule {
    pub first_condition: &'static str,
    pub second_condition: &'static str,
    pub within_ms: i64,
    pub composite_condition: &'static str,
}

impl CompoundRule {
    pub const fn hypotensive_hypoxemia() -> Self {
        Self {
            first_condition: SYSTOLIC_CRITICAL,
            second_condition: LOW_SATURATION,
            within_ms: HYPOTENSIVE_HYPOXEMIA_WINDOW_MS,
            composite_condition: HYPOTENSIVE_HYPOXEMIA,
        }
    }

    fn involves(&self, alert: &Alert) -> bool {
        alert.condition == self.first_condition || alert.condition == self.second_condition
    }
}

/// Apply `rule` to one patient's alerts.
///
/// Matching alerts are ordered by timestamp and walked as adjacent pairs. A pair inside
/// the window is consumed into a composite stamped with the earlier timestamp, and the
/// walk continues after it. Returns the unconsumed alerts in their original order
/// followed by the composites.
pub fn correlate(alerts: Vec<Alert>, rule: &CompoundRule) -> Vec<Alert> {
    let mut matching: Vec<usize> = (0..alerts.len())
        .filter(|&i| rule.involves(&alerts[i]))
        .collect();
    matching.sort_by_key(|&i| alerts[i].timestamp);

    let mut consumed = vec![false; alerts.len()];
    let mut composites = Vec::new();

    let mut k = 0;
    while k + 1 < matching.len() {
        let earlier = &alerts[matching[k]];
        let later = &alerts[matching[k + 1]];

        if later.timestamp - earlier.timestamp <= rule.within_ms {
            consumed[matching[k]] = true;
            consumed[matching[k + 1]] = true;
            composites.push(Alert::high_priority(
                earlier.patient_id.clone(),
                rule.composite_condition,
                earlier.timestamp,
            ));
            k += 2;
        } else {
            k += 1;
        }
    }

    if !composites.is_empty() {
        log::debug!(
            "{} composite {} alert(s) formed",
            composites.len(),
            rule.composite_condition
        );
    }

    alerts
        .into_iter()
        .zip(consumed)
        .filter_map(|(alert, used)| (!used).then_some(alert))
        .chain(composites)
        .collect()
}
