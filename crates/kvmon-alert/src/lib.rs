//! Threshold and rate-of-change rule evaluation for server health snapshots.
//!
//! The [`evaluator::HealthEvaluator`] runs a fixed, ordered set of
//! [`HealthRule`] implementations against the current snapshot and the
//! previous one (the rate-rule baseline). Evaluation is a pure function of
//! its inputs; deduplication and history management live in the engine.

pub mod evaluator;
pub mod rules;

#[cfg(test)]
mod tests;

use kvmon_common::types::{Alert, MetricSnapshot};
use serde::{Deserialize, Serialize};

/// One independent threshold or rate check producing zero or one alert.
///
/// Rules read only the snapshot fields they need and must tolerate an
/// absent previous snapshot: with no prior data, deltas are zero and rate
/// rules do not fire.
pub trait HealthRule: Send + Sync {
    /// Short rule name used for logging.
    fn name(&self) -> &'static str;

    /// Evaluates the rule against the current snapshot.
    fn evaluate(
        &self,
        current: &MetricSnapshot,
        previous: Option<&MetricSnapshot>,
        thresholds: &Thresholds,
    ) -> Option<Alert>;
}

/// Per-category alert thresholds, immutable per monitoring run.
///
/// `critical` thresholds are evaluated before `warning` ones, so a
/// misconfiguration where critical <= warning still gives critical priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_memory_warning_percent")]
    pub memory_warning_percent: f64,
    #[serde(default = "default_memory_critical_percent")]
    pub memory_critical_percent: f64,
    #[serde(default = "default_clients_warning")]
    pub clients_warning: u64,
    #[serde(default = "default_clients_critical")]
    pub clients_critical: u64,
    #[serde(default = "default_rejected_connections_threshold")]
    pub rejected_connections_threshold: u64,
    #[serde(default = "default_blocked_clients_threshold")]
    pub blocked_clients_threshold: u64,
    #[serde(default = "default_fragmentation_ratio_threshold")]
    pub fragmentation_ratio_threshold: f64,
    /// Reserved for a throughput-drop rule; carried on the config surface
    /// but not consumed by the current rule set.
    #[serde(default = "default_ops_per_sec_low_threshold")]
    pub ops_per_sec_low_threshold: u64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            memory_warning_percent: default_memory_warning_percent(),
            memory_critical_percent: default_memory_critical_percent(),
            clients_warning: default_clients_warning(),
            clients_critical: default_clients_critical(),
            rejected_connections_threshold: default_rejected_connections_threshold(),
            blocked_clients_threshold: default_blocked_clients_threshold(),
            fragmentation_ratio_threshold: default_fragmentation_ratio_threshold(),
            ops_per_sec_low_threshold: default_ops_per_sec_low_threshold(),
        }
    }
}

fn default_memory_warning_percent() -> f64 {
    80.0
}

fn default_memory_critical_percent() -> f64 {
    90.0
}

fn default_clients_warning() -> u64 {
    1000
}

fn default_clients_critical() -> u64 {
    5000
}

fn default_rejected_connections_threshold() -> u64 {
    10
}

fn default_blocked_clients_threshold() -> u64 {
    50
}

fn default_fragmentation_ratio_threshold() -> f64 {
    1.5
}

fn default_ops_per_sec_low_threshold() -> u64 {
    100
}
