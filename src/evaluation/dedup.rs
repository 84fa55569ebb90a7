//! First-alert-per-condition deduplication

use crate::alerts::Alert;
use std::collections::HashSet;

/// Keep the first alert seen for each condition, preserving input order
pub fn deduplicate(alerts: Vec<Alert>) -> Vec<Alert> {
    let mut seen: HashSet<String> = HashSet::new();
    alerts
        .into_iter()
        .filter(|alert| seen.insert(alert.condition.clone()))
        .collect()
}
