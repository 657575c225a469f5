use crate::evaluator::HealthEvaluator;
use crate::Thresholds;
use kvmon_common::types::{AlertLevel, MetricSnapshot};

fn make_snapshot() -> MetricSnapshot {
    MetricSnapshot::default()
}

fn memory_snapshot(used: u64, max: u64) -> MetricSnapshot {
    let mut snapshot = make_snapshot();
    snapshot.used_memory = used;
    snapshot.maxmemory = max;
    snapshot.memory_usage_percent = if max > 0 {
        (used as f64 / max as f64 * 100.0 * 100.0).round() / 100.0
    } else {
        0.0
    };
    snapshot
}

#[test]
fn unreachable_server_yields_single_connection_critical() {
    let evaluator = HealthEvaluator::new();
    let alerts = evaluator.evaluate(None, None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Critical);
    assert_eq!(alerts[0].category, "connection");
    assert!(alerts[0].snapshot.is_none());
}

#[test]
fn memory_critical_at_95_percent() {
    // used_memory=950, maxmemory=1000 (95%), critical threshold 90.
    let evaluator = HealthEvaluator::new();
    let snapshot = memory_snapshot(950, 1000);
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Critical);
    assert_eq!(alerts[0].category, "memory");
    assert!(alerts[0].message.contains("95.00%"));
    assert!(alerts[0].message.contains("90%"));
    assert!(alerts[0].snapshot.is_some());
}

#[test]
fn memory_warning_between_thresholds() {
    let evaluator = HealthEvaluator::new();
    let snapshot = memory_snapshot(850, 1000);
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Warning);
    assert_eq!(alerts[0].category, "memory");
}

#[test]
fn memory_levels_are_mutually_exclusive() {
    let evaluator = HealthEvaluator::new();
    let snapshot = memory_snapshot(950, 1000);
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    let memory_alerts: Vec<_> = alerts.iter().filter(|a| a.category == "memory").collect();
    assert_eq!(memory_alerts.len(), 1);
}

#[test]
fn misconfigured_thresholds_critical_still_wins() {
    // critical <= warning is a caller misconfiguration; critical is
    // evaluated first and must take priority.
    let evaluator = HealthEvaluator::new();
    let thresholds = Thresholds {
        memory_warning_percent: 90.0,
        memory_critical_percent: 50.0,
        ..Thresholds::default()
    };
    let snapshot = memory_snapshot(950, 1000);
    let alerts = evaluator.evaluate(Some(&snapshot), None, &thresholds);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Critical);
}

#[test]
fn rejected_connections_fires_on_delta_at_threshold() {
    // rejected 5 -> 20 with threshold 10 fires on the second evaluation only.
    let evaluator = HealthEvaluator::new();
    let thresholds = Thresholds::default();

    let mut first = make_snapshot();
    first.rejected_connections = 5;
    let alerts = evaluator.evaluate(Some(&first), None, &thresholds);
    assert!(alerts.is_empty());

    let mut second = make_snapshot();
    second.rejected_connections = 20;
    let alerts = evaluator.evaluate(Some(&second), Some(&first), &thresholds);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Critical);
    assert_eq!(alerts[0].category, "connection");
    assert!(alerts[0].message.contains("15"));
}

#[test]
fn rejected_connections_quiet_below_threshold_delta() {
    let evaluator = HealthEvaluator::new();
    let mut first = make_snapshot();
    first.rejected_connections = 5;
    let mut second = make_snapshot();
    second.rejected_connections = 14; // delta 9 < 10
    let alerts = evaluator.evaluate(Some(&second), Some(&first), &Thresholds::default());
    assert!(alerts.is_empty());
}

#[test]
fn rate_rules_do_not_fire_without_previous_snapshot() {
    let evaluator = HealthEvaluator::new();
    let mut snapshot = make_snapshot();
    snapshot.rejected_connections = 1000;
    snapshot.evicted_keys = 1000;
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert!(alerts.is_empty());
}

#[test]
fn connected_clients_critical_over_warning() {
    let evaluator = HealthEvaluator::new();
    let mut snapshot = make_snapshot();
    snapshot.connected_clients = 5000;
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Critical);

    snapshot.connected_clients = 1000;
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Warning);
}

#[test]
fn blocked_clients_warns_at_threshold() {
    let evaluator = HealthEvaluator::new();
    let mut snapshot = make_snapshot();
    snapshot.blocked_clients = 50;
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Warning);
    assert_eq!(alerts[0].category, "connection");
}

#[test]
fn persistence_rules_fire_independently() {
    let evaluator = HealthEvaluator::new();
    let mut snapshot = make_snapshot();
    snapshot.rdb_last_bgsave_status = "err".to_string();
    snapshot.aof_enabled = true;
    snapshot.aof_last_bgrewrite_status = "err".to_string();
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 2);
    assert!(alerts.iter().all(|a| a.category == "persistence"));
    assert!(alerts.iter().all(|a| a.level == AlertLevel::Critical));
}

#[test]
fn aof_rewrite_quiet_when_aof_disabled() {
    let evaluator = HealthEvaluator::new();
    let mut snapshot = make_snapshot();
    snapshot.aof_enabled = false;
    snapshot.aof_last_bgrewrite_status = "err".to_string();
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert!(alerts.is_empty());
}

#[test]
fn replication_alert_requires_replica_role_and_down_link() {
    let evaluator = HealthEvaluator::new();
    let mut snapshot = make_snapshot();
    snapshot.role = "slave".to_string();
    snapshot.master_link_status = "down".to_string();
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].category, "replication");

    // Master role with a "down" link field is not a replication failure.
    snapshot.role = "master".to_string();
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert!(alerts.is_empty());

    // Newer role spelling.
    snapshot.role = "replica".to_string();
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
}

#[test]
fn fragmentation_warns_above_threshold() {
    let evaluator = HealthEvaluator::new();
    let mut snapshot = make_snapshot();
    snapshot.mem_fragmentation_ratio = 1.6;
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Warning);

    snapshot.mem_fragmentation_ratio = 1.5; // boundary: strictly greater-than
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert!(alerts.is_empty());
}

#[test]
fn eviction_message_states_the_delta() {
    let evaluator = HealthEvaluator::new();
    let mut first = make_snapshot();
    first.evicted_keys = 10;
    let mut second = make_snapshot();
    second.evicted_keys = 17;
    let alerts = evaluator.evaluate(Some(&second), Some(&first), &Thresholds::default());
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::Warning);
    assert!(alerts[0].message.contains('7'));
}

#[test]
fn multiple_rules_fire_in_fixed_rule_order() {
    let evaluator = HealthEvaluator::new();
    let mut snapshot = memory_snapshot(950, 1000);
    snapshot.blocked_clients = 60;
    snapshot.mem_fragmentation_ratio = 2.0;
    let alerts = evaluator.evaluate(Some(&snapshot), None, &Thresholds::default());
    assert_eq!(alerts.len(), 3);
    // Fixed order: memory usage, blocked clients, fragmentation.
    assert_eq!(alerts[0].category, "memory");
    assert!(alerts[0].message.contains("memory usage"));
    assert_eq!(alerts[1].category, "connection");
    assert_eq!(alerts[2].category, "memory");
    assert!(alerts[2].message.contains("fragmentation"));
}

#[test]
fn healthy_snapshot_produces_no_alerts() {
    let evaluator = HealthEvaluator::new();
    let snapshot = make_snapshot();
    let alerts = evaluator.evaluate(Some(&snapshot), Some(&snapshot), &Thresholds::default());
    assert!(alerts.is_empty());
}
