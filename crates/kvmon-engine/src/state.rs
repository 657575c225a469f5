use chrono::{DateTime, Utc};
use kvmon_common::types::{Alert, AlertLevel, ConnectionStatus, MetricSnapshot};
use serde::Serialize;

use crate::history::BoundedLog;

/// Alert and error-log histories keep at most this many entries.
pub const HISTORY_CAPACITY: usize = 100;

/// How many alerts and error lines a status summary carries.
const STATUS_TAIL: usize = 10;

/// How many error-log lines accompany an analysis context.
const ANALYSIS_ERROR_TAIL: usize = 5;

/// Mutable monitoring record, owned by the engine and mutated only under
/// its lock. `previous` is the single rate-rule baseline; it is replaced
/// atomically with `last_snapshot` on every completed evaluation so deltas
/// are never double-counted.
pub(crate) struct MonitorState {
    pub connection_status: ConnectionStatus,
    pub last_snapshot: Option<MetricSnapshot>,
    pub previous: Option<MetricSnapshot>,
    pub last_check: Option<DateTime<Utc>>,
    pub alerts: BoundedLog<Alert>,
    pub error_log: BoundedLog<String>,
}

impl MonitorState {
    pub fn new() -> Self {
        Self {
            connection_status: ConnectionStatus::Disconnected,
            last_snapshot: None,
            previous: None,
            last_check: None,
            alerts: BoundedLog::new(HISTORY_CAPACITY),
            error_log: BoundedLog::new(HISTORY_CAPACITY),
        }
    }

    /// Commits one completed poll: replaces the last snapshot and the
    /// rate-rule baseline, appends the new alerts, stamps the check time.
    pub fn record(&mut self, snapshot: MetricSnapshot, alerts: &[Alert]) {
        self.last_snapshot = Some(snapshot.clone());
        self.previous = Some(snapshot);
        self.last_check = Some(Utc::now());
        for alert in alerts {
            self.alerts.push(alert.clone());
        }
    }

    /// Appends a timestamped line to the bounded error log. Alert history
    /// is not touched.
    pub fn record_error(&mut self, message: &str) {
        self.error_log
            .push(format!("[{}] {}", Utc::now().to_rfc3339(), message));
    }
}

/// Read-only projection of the engine state. Produced from a point-in-time
/// copy; never triggers a sample.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSummary {
    pub is_running: bool,
    pub connection_status: ConnectionStatus,
    pub last_check: Option<DateTime<Utc>>,
    pub last_snapshot: Option<MetricSnapshot>,
    pub recent_alerts: Vec<Alert>,
    pub recent_errors: Vec<String>,
    pub target: String,
    pub interval_secs: u64,
}

/// Incident bundle handed to the (out-of-scope) analysis pipeline: the most
/// severe recent alert with its triggering snapshot and the error-log tail.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisContext {
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub error_logs: Vec<String>,
    pub snapshot: Option<MetricSnapshot>,
    pub server_version: String,
}

impl MonitorState {
    pub fn status_summary(&self, is_running: bool, target: String, interval_secs: u64) -> StatusSummary {
        StatusSummary {
            is_running,
            connection_status: self.connection_status.clone(),
            last_check: self.last_check,
            last_snapshot: self.last_snapshot.clone(),
            recent_alerts: self.alerts.tail(STATUS_TAIL),
            recent_errors: self.error_log.tail(STATUS_TAIL),
            target,
            interval_secs,
        }
    }

    /// Most recent critical alert, falling back to the most recent alert of
    /// any level; `None` when nothing has fired yet.
    pub fn analysis_context(&self) -> Option<AnalysisContext> {
        let alert = self
            .alerts
            .iter()
            .rev()
            .find(|a| a.level == AlertLevel::Critical)
            .or_else(|| self.alerts.iter().next_back())?;

        let mut error_logs = vec![alert.message.clone()];
        error_logs.extend(self.error_log.tail(ANALYSIS_ERROR_TAIL));

        let server_version = alert
            .snapshot
            .as_ref()
            .map(|s| s.server_version.clone())
            .unwrap_or_else(|| "unknown".to_string());

        Some(AnalysisContext {
            timestamp: alert.timestamp,
            description: format!("auto-detected incident: {}", alert.message),
            error_logs,
            snapshot: alert.snapshot.clone(),
            server_version,
        })
    }
}
