//! Alert rule and active alert models.
//!
//! Rules are static threshold conditions over one metric; an active alert
//! is the runtime state recording that a rule's condition currently holds.

use crate::models::{LogLevel, MetricSample};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Comparison operator of an alert rule.
///
/// Operators are resolved to this closed enum when a rule is constructed,
/// never looked up by string at evaluation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// Value strictly greater than the threshold.
    #[serde(rename = ">")]
    Gt,
    /// Value strictly less than the threshold.
    #[serde(rename = "<")]
    Lt,
    /// Value greater than or equal to the threshold.
    #[serde(rename = ">=")]
    Ge,
    /// Value less than or equal to the threshold.
    #[serde(rename = "<=")]
    Le,
    /// Value equal to the threshold.
    #[serde(rename = "==")]
    Eq,
}

impl CompareOp {
    /// Applies the comparison to `value` against `threshold`.
    #[must_use]
    pub fn compare(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Gt => value > threshold,
            Self::Lt => value < threshold,
            Self::Ge => value >= threshold,
            Self::Le => value <= threshold,
            Self::Eq => (value - threshold).abs() < f64::EPSILON,
        }
    }
}

impl std::fmt::Display for CompareOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gt => write!(f, ">"),
            Self::Lt => write!(f, "<"),
            Self::Ge => write!(f, ">="),
            Self::Le => write!(f, "<="),
            Self::Eq => write!(f, "=="),
        }
    }
}

/// Error returned when parsing an unknown operator symbol.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown comparison operator: '{0}'")]
pub struct ParseCompareOpError(String);

impl std::str::FromStr for CompareOp {
    type Err = ParseCompareOpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            ">" => Ok(Self::Gt),
            "<" => Ok(Self::Lt),
            ">=" => Ok(Self::Ge),
            "<=" => Ok(Self::Le),
            "==" => Ok(Self::Eq),
            other => Err(ParseCompareOpError(other.to_string())),
        }
    }
}

/// Severity of an alert rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational alert.
    Info,
    /// Warning alert.
    Warning,
    /// Critical alert.
    Critical,
}

impl Severity {
    /// Log level used when a rule of this severity triggers.
    #[must_use]
    pub fn log_level(self) -> LogLevel {
        match self {
            Self::Info => LogLevel::Info,
            Self::Warning => LogLevel::Warning,
            Self::Critical => LogLevel::Critical,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// A static threshold condition over one metric.
///
/// Rules are immutable after load.
///
/// # Example
///
/// ```
/// use shared::models::{AlertRule, CompareOp, Severity};
///
/// let rule = AlertRule::new(
///     "High Memory Usage",
///     "system.memory_usage",
///     CompareOp::Gt,
///     80.0,
///     Severity::Warning,
/// );
///
/// assert!(rule.is_breached(85.0));
/// assert!(!rule.is_breached(70.0));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// Human-readable rule name.
    pub name: String,
    /// Name of the metric the rule watches.
    pub metric_name: String,
    /// Comparison operator.
    pub op: CompareOp,
    /// Threshold the sampled value is compared against.
    pub threshold: f64,
    /// Severity assigned to triggered alerts.
    pub severity: Severity,
    /// Disabled rules are never evaluated.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl AlertRule {
    /// Creates a new enabled rule.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        metric_name: impl Into<String>,
        op: CompareOp,
        threshold: f64,
        severity: Severity,
    ) -> Self {
        Self {
            name: name.into(),
            metric_name: metric_name.into(),
            op,
            threshold,
            severity,
            enabled: true,
        }
    }

    /// Returns true when `value` breaches the rule's condition.
    #[must_use]
    pub fn is_breached(&self, value: f64) -> bool {
        self.op.compare(value, self.threshold)
    }

    /// Default rule set watching the system probes.
    #[must_use]
    pub fn default_rules() -> Vec<Self> {
        vec![
            Self::new(
                "High CPU Usage",
                "system.load_avg",
                CompareOp::Gt,
                2.0,
                Severity::Warning,
            ),
            Self::new(
                "High Memory Usage",
                "system.memory_usage",
                CompareOp::Gt,
                80.0,
                Severity::Warning,
            ),
            Self::new(
                "Critical Memory Usage",
                "system.memory_usage",
                CompareOp::Gt,
                90.0,
                Severity::Critical,
            ),
            Self::new(
                "High Disk Usage",
                "system.disk_usage",
                CompareOp::Gt,
                85.0,
                Severity::Warning,
            ),
            Self::new(
                "Critical Disk Usage",
                "system.disk_usage",
                CompareOp::Gt,
                95.0,
                Severity::Critical,
            ),
        ]
    }
}

/// Runtime state of a rule whose condition currently holds.
///
/// Keyed by (rule name, metric name); the alert manager keeps at most one
/// entry per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveAlert {
    /// Name of the triggering rule.
    pub name: String,
    /// Metric the rule watches.
    pub metric: String,
    /// Severity of the rule.
    pub severity: Severity,
    /// Threshold of the rule.
    pub threshold: f64,
    /// Sampled value that most recently breached the threshold.
    pub current_value: f64,
    /// Time of the trigger transition.
    pub triggered_at: DateTime<Utc>,
}

impl ActiveAlert {
    /// Creates the active-alert state for `rule` breached by `sample`.
    #[must_use]
    pub fn from_breach(rule: &AlertRule, sample: &MetricSample) -> Self {
        Self {
            name: rule.name.clone(),
            metric: rule.metric_name.clone(),
            severity: rule.severity,
            threshold: rule.threshold,
            current_value: sample.metric_value,
            triggered_at: sample.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_op_semantics() {
        assert!(CompareOp::Gt.compare(2.0, 1.0));
        assert!(!CompareOp::Gt.compare(1.0, 1.0));
        assert!(CompareOp::Lt.compare(0.5, 1.0));
        assert!(CompareOp::Ge.compare(1.0, 1.0));
        assert!(CompareOp::Le.compare(1.0, 1.0));
        assert!(CompareOp::Eq.compare(1.0, 1.0));
        assert!(!CompareOp::Eq.compare(1.0, 1.1));
    }

    #[test]
    fn test_compare_op_from_str() {
        assert_eq!(">".parse::<CompareOp>().unwrap(), CompareOp::Gt);
        assert_eq!(">=".parse::<CompareOp>().unwrap(), CompareOp::Ge);
        assert_eq!("==".parse::<CompareOp>().unwrap(), CompareOp::Eq);
        assert!("!=".parse::<CompareOp>().is_err());
    }

    #[test]
    fn test_compare_op_serde_symbols() {
        assert_eq!(serde_json::to_string(&CompareOp::Ge).unwrap(), "\">=\"");
        let op: CompareOp = serde_json::from_str("\"<\"").unwrap();
        assert_eq!(op, CompareOp::Lt);
    }

    #[test]
    fn test_severity_log_level() {
        assert_eq!(Severity::Info.log_level(), LogLevel::Info);
        assert_eq!(Severity::Warning.log_level(), LogLevel::Warning);
        assert_eq!(Severity::Critical.log_level(), LogLevel::Critical);
    }

    #[test]
    fn test_rule_breach() {
        let rule = AlertRule::new(
            "High Memory",
            "system.memory_usage",
            CompareOp::Gt,
            80.0,
            Severity::Warning,
        );

        assert!(rule.is_breached(80.1));
        assert!(!rule.is_breached(80.0));
        assert!(!rule.is_breached(12.0));
    }

    #[test]
    fn test_default_rules() {
        let rules = AlertRule::default_rules();

        assert_eq!(rules.len(), 5);
        assert!(rules.iter().all(|r| r.enabled));
        assert!(rules
            .iter()
            .any(|r| r.metric_name == "system.memory_usage" && r.severity == Severity::Critical));
    }

    #[test]
    fn test_rule_deserialization_default_enabled() {
        let json = r#"{
            "name": "High Disk Usage",
            "metric_name": "system.disk_usage",
            "op": ">",
            "threshold": 85.0,
            "severity": "warning"
        }"#;

        let rule: AlertRule = serde_json::from_str(json).unwrap();

        assert!(rule.enabled);
        assert_eq!(rule.op, CompareOp::Gt);
        assert_eq!(rule.severity, Severity::Warning);
    }

    #[test]
    fn test_active_alert_from_breach() {
        let rule = AlertRule::new("High Load", "system.load_avg", CompareOp::Gt, 2.0, Severity::Warning);
        let sample = MetricSample::new("system.load_avg", 3.5, "count");

        let alert = ActiveAlert::from_breach(&rule, &sample);

        assert_eq!(alert.name, "High Load");
        assert_eq!(alert.metric, "system.load_avg");
        assert!((alert.current_value - 3.5).abs() < f64::EPSILON);
        assert_eq!(alert.triggered_at, sample.timestamp);
    }
}
