use kvmon_common::types::{category, Alert, AlertLevel, MetricSnapshot};

use crate::{HealthRule, Thresholds};

/// Memory usage against the configured limit. Critical is checked first so
/// it wins even when the thresholds are misconfigured (critical <= warning);
/// the two levels are mutually exclusive.
pub struct MemoryUsageRule;

impl HealthRule for MemoryUsageRule {
    fn name(&self) -> &'static str {
        "memory_usage"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        _previous: Option<&MetricSnapshot>,
        thresholds: &Thresholds,
    ) -> Option<Alert> {
        let pct = current.memory_usage_percent;
        if pct >= thresholds.memory_critical_percent {
            Some(Alert::new(
                AlertLevel::Critical,
                category::MEMORY,
                format!(
                    "memory usage critical: {:.2}% (threshold: {}%)",
                    pct, thresholds.memory_critical_percent
                ),
                Some(current.clone()),
            ))
        } else if pct >= thresholds.memory_warning_percent {
            Some(Alert::new(
                AlertLevel::Warning,
                category::MEMORY,
                format!(
                    "memory usage high: {:.2}% (threshold: {}%)",
                    pct, thresholds.memory_warning_percent
                ),
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}

/// Fragmentation ratio above the configured threshold.
pub struct FragmentationRule;

impl HealthRule for FragmentationRule {
    fn name(&self) -> &'static str {
        "fragmentation"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        _previous: Option<&MetricSnapshot>,
        thresholds: &Thresholds,
    ) -> Option<Alert> {
        if current.mem_fragmentation_ratio > thresholds.fragmentation_ratio_threshold {
            Some(Alert::new(
                AlertLevel::Warning,
                category::MEMORY,
                format!(
                    "memory fragmentation ratio high: {:.2} (threshold: {:.1})",
                    current.mem_fragmentation_ratio, thresholds.fragmentation_ratio_threshold
                ),
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}

/// Keys evicted since the previous poll. Rate rule: does not fire without a
/// previous snapshot.
pub struct EvictionRule;

impl HealthRule for EvictionRule {
    fn name(&self) -> &'static str {
        "eviction"
    }

    fn evaluate(
        &self,
        current: &MetricSnapshot,
        previous: Option<&MetricSnapshot>,
        _thresholds: &Thresholds,
    ) -> Option<Alert> {
        let previous = previous?;
        if current.evicted_keys > previous.evicted_keys {
            let delta = current.evicted_keys - previous.evicted_keys;
            Some(Alert::new(
                AlertLevel::Warning,
                category::MEMORY,
                format!(
                    "keys evicted: {} since last check (total {})",
                    delta, current.evicted_keys
                ),
                Some(current.clone()),
            ))
        } else {
            None
        }
    }
}
