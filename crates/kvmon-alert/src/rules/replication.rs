use kvmon_common::types::{category, Alert, AlertLevel, MetricSnapshot};

use crate::{HealthRule, Thresholds};

/// Replica role with a downed master link. Both "slave" and "replica" role
/// spellings are accepted since servers report either depending on version.
pub struct ReplicationLinkRule;

impl HealthRule for ReplicationLinkRule {
    fn name(&self) -> &'static str {
        "replication_link"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        _previous: Option<&MetricSnapshot>,
        _thresholds: &Thresholds,
    ) -> Option<Alert> {
        let is_replica = current.role == "slave" || current.role == "replica";
        if is_replica && current.master_link_status == "down" {
            Some(Alert::new(
                AlertLevel::Critical,
                category::REPLICATION,
                "master link down: replica has lost contact with its master",
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}
