use kvmon_common::types::{category, Alert, AlertLevel, MetricSnapshot};

use crate::{HealthRule, Thresholds};

/// Last background-save status not "ok".
pub struct BackgroundSaveRule;

impl HealthRule for BackgroundSaveRule {
    fn name(&self) -> &'static str {
        "background_save"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        _previous: Option<&MetricSnapshot>,
        _thresholds: &Thresholds,
    ) -> Option<Alert> {
        if current.rdb_last_bgsave_status != "ok" {
            Some(Alert::new(
                AlertLevel::Critical,
                category::PERSISTENCE,
                format!(
                    "background save failed: last status '{}'",
                    current.rdb_last_bgsave_status
                ),
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}

/// Append-only persistence enabled and its last rewrite not "ok".
/// Independent of [`BackgroundSaveRule`]; both may fire on the same tick.
pub struct AofRewriteRule;

impl HealthRule for AofRewriteRule {
    fn name(&self) -> &'static str {
        "aof_rewrite"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        _previous: Option<&MetricSnapshot>,
        _thresholds: &Thresholds,
    ) -> Option<Alert> {
        if current.aof_enabled && current.aof_last_bgrewrite_status != "ok" {
            Some(Alert::new(
                AlertLevel::Critical,
                category::PERSISTENCE,
                format!(
                    "append-only rewrite failed: last status '{}'",
                    current.aof_last_bgrewrite_status
                ),
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}
