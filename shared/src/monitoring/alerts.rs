//! Threshold alert manager.
//!
//! Alerting is level-triggered: an alert is active exactly while its
//! rule's condition holds against the most recent sample of the metric.
//! State transitions (trigger and resolve) are reported once each; a
//! breach that stays breached produces no further events.

use crate::models::{ActiveAlert, AlertRule, MetricSample};
use std::collections::HashMap;
use std::sync::Mutex;

/// A state transition produced by one evaluation pass.
#[derive(Debug, Clone)]
pub enum AlertEvent {
    /// The rule's condition started holding.
    Triggered(ActiveAlert),
    /// The rule's condition stopped holding.
    Resolved(ActiveAlert),
}

/// Tracks rule state across evaluation passes.
///
/// Interior mutability keeps the caller side simple: the collector and
/// the dashboard share one manager behind an `Arc`, and only the
/// collector's tick mutates state.
pub struct AlertManager {
    rules: Vec<AlertRule>,
    active: Mutex<HashMap<(String, String), ActiveAlert>>,
}

impl AlertManager {
    /// Creates a manager over the given rule set.
    #[must_use]
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self {
            rules,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a manager with the default system rule set.
    #[must_use]
    pub fn with_default_rules() -> Self {
        Self::new(AlertRule::default_rules())
    }

    /// The configured rules.
    #[must_use]
    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Evaluates every enabled rule against the given samples.
    ///
    /// Each rule is matched with the sample carrying its metric name; a
    /// rule whose metric is absent from `samples` is skipped and keeps
    /// its current state. Returns the transitions this pass produced, in
    /// rule order.
    pub fn evaluate(&self, samples: &[MetricSample]) -> Vec<AlertEvent> {
        let by_name: HashMap<&str, &MetricSample> = samples
            .iter()
            .map(|s| (s.metric_name.as_str(), s))
            .collect();

        let mut active = self
            .active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut events = Vec::new();
        for rule in self.rules.iter().filter(|r| r.enabled) {
            let Some(sample) = by_name.get(rule.metric_name.as_str()) else {
                continue;
            };

            let key = (rule.name.clone(), rule.metric_name.clone());
            let breached = rule.is_breached(sample.metric_value);

            match (breached, active.contains_key(&key)) {
                (true, false) => {
                    let alert = ActiveAlert::from_breach(rule, sample);
                    active.insert(key, alert.clone());
                    events.push(AlertEvent::Triggered(alert));
                }
                (false, true) => {
                    if let Some(mut alert) = active.remove(&key) {
                        alert.current_value = sample.metric_value;
                        events.push(AlertEvent::Resolved(alert));
                    }
                }
                // Still breached or still clear: no transition.
                _ => {}
            }
        }
        events
    }

    /// Currently active alerts, sorted by rule name.
    #[must_use]
    pub fn active_alerts(&self) -> Vec<ActiveAlert> {
        let active = self
            .active
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut alerts: Vec<ActiveAlert> = active.values().cloned().collect();
        alerts.sort_by(|a, b| a.name.cmp(&b.name));
        alerts
    }
}
