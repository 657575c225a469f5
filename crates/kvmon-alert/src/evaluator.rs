use kvmon_common::types::{category, Alert, AlertLevel, MetricSnapshot};

use crate::rules::clients::{BlockedClientsRule, ConnectedClientsRule, RejectedConnectionsRule};
use crate::rules::memory::{EvictionRule, FragmentationRule, MemoryUsageRule};
use crate::rules::persistence::{AofRewriteRule, BackgroundSaveRule};
use crate::rules::replication::ReplicationLinkRule;
use crate::{HealthRule, Thresholds};

/// Runs the fixed rule set against a snapshot pair.
///
/// Rules are independent and all evaluated; alerts come back in rule order.
/// The only short-circuit is an absent current snapshot, which yields a
/// single critical connection alert and skips everything else.
pub struct HealthEvaluator {
    rules: Vec<Box<dyn HealthRule>>,
}

impl HealthEvaluator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(MemoryUsageRule),
                Box::new(ConnectedClientsRule),
                Box::new(RejectedConnectionsRule),
                Box::new(BlockedClientsRule),
                Box::new(BackgroundSaveRule),
                Box::new(AofRewriteRule),
                Box::new(ReplicationLinkRule),
                Box::new(FragmentationRule),
                Box::new(EvictionRule),
            ],
        }
    }

    pub fn rules(&self) -> &[Box<dyn HealthRule>] {
        &self.rules
    }

    /// Pure evaluation: deterministic given the same snapshot pair and
    /// thresholds. `previous` is the baseline for the rate-of-change rules
    /// and must come from the prior completed poll.
    pub fn evaluate(
        &self,
        current: Option<&MetricSnapshot>,
        previous: Option<&MetricSnapshot>,
        thresholds: &Thresholds,
    ) -> Vec<Alert> {
        let Some(current) = current else {
            return vec![Alert::new(
                AlertLevel::Critical,
                category::CONNECTION,
                "server unreachable: no status report could be collected",
                None,
            )];
        };

        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(current, previous, thresholds))
            .collect()
    }
}

impl Default for HealthEvaluator {
    fn default() -> Self {
        Self::new()
    }
}
