use kvmon_common::types::{category, Alert, AlertLevel, MetricSnapshot};

use crate::{HealthRule, Thresholds};

/// Connected client count. Critical is checked first; the two levels are
/// mutually exclusive.
pub struct ConnectedClientsRule;

impl HealthRule for ConnectedClientsRule {
    fn name(&self) -> &'static str {
        "connected_clients"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        _previous: Option<&MetricSnapshot>,
        thresholds: &Thresholds,
    ) -> Option<Alert> {
        let connected = current.connected_clients;
        if connected >= thresholds.clients_critical {
            Some(Alert::new(
                AlertLevel::Critical,
                category::CONNECTION,
                format!(
                    "connected clients critical: {} (threshold: {})",
                    connected, thresholds.clients_critical
                ),
                Some(current.clone()),
            ))
        } else if connected >= thresholds.clients_warning {
            Some(Alert::new(
                AlertLevel::Warning,
                category::CONNECTION,
                format!(
                    "connected clients high: {} (threshold: {})",
                    connected, thresholds.clients_warning
                ),
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}

/// Rejected connections since the previous poll. Rate rule: with no
/// previous snapshot the delta is treated as zero and the rule stays quiet.
pub struct RejectedConnectionsRule;

impl HealthRule for RejectedConnectionsRule {
    fn name(&self) -> &'static str {
        "rejected_connections"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        previous: Option<&MetricSnapshot>,
        thresholds: &Thresholds,
    ) -> Option<Alert> {
        let previous = previous?;
        let delta = current
            .rejected_connections
            .saturating_sub(previous.rejected_connections);
        if delta >= thresholds.rejected_connections_threshold {
            Some(Alert::new(
                AlertLevel::Critical,
                category::CONNECTION,
                format!(
                    "connections rejected: {} since last check (total {})",
                    delta, current.rejected_connections
                ),
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}

/// Blocked client count at or above the configured threshold.
pub struct BlockedClientsRule;

impl HealthRule for BlockedClientsRule {
    fn name(&self) -> &'static str {
        "blocked_clients"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        _previous: Option<&MetricSnapshot>,
        thresholds: &Thresholds,
    ) -> Option<Alert> {
        if current.blocked_clients >= thresholds.blocked_clients_threshold {
            Some(Alert::new(
                AlertLevel::Warning,
                category::CONNECTION,
                format!(
                    "blocked clients: {} (threshold: {})",
                    current.blocked_clients, thresholds.blocked_clients_threshold
                ),
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}
