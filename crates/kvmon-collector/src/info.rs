//! Flat status-report parsing and projection into [`MetricSnapshot`].

use chrono::{DateTime, Utc};
use kvmon_common::types::MetricSnapshot;
use std::collections::HashMap;

/// The raw status report: a flat `key:value` mapping as returned by the
/// server's INFO command. Section headers (`# Memory`) and blank lines are
/// skipped during parsing.
///
/// # Examples
///
/// ```
/// use kvmon_collector::info::InfoReport;
///
/// let report = InfoReport::parse("# Memory\r\nused_memory:1024\r\nmaxmemory:4096\r\n");
/// assert_eq!(report.get_u64("used_memory"), 1024);
/// assert_eq!(report.get_u64("no_such_key"), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InfoReport {
    fields: HashMap<String, String>,
}

impl InfoReport {
    pub fn parse(raw: &str) -> Self {
        let mut fields = HashMap::new();
        for line in raw.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some((key, value)) = line.split_once(':') {
                fields.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Unsigned counter field; 0 when missing or malformed.
    pub fn get_u64(&self, key: &str) -> u64 {
        self.fields
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Ratio field; 0.0 when missing or malformed.
    pub fn get_f64(&self, key: &str) -> f64 {
        self.fields
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0)
    }

    /// String field with an explicit default for when the key is absent.
    pub fn get_str(&self, key: &str, default: &str) -> String {
        self.fields
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.to_string())
    }

    /// Boolean flag reported as `0`/`1`.
    pub fn get_flag(&self, key: &str) -> bool {
        self.get_u64(key) != 0
    }

    /// Projects the report into a fully populated snapshot. Missing fields
    /// take their quiescent defaults; the two derived percentages are
    /// computed here and rounded to 2 decimals.
    pub fn project(&self, collected_at: DateTime<Utc>) -> MetricSnapshot {
        let keyspace_hits = self.get_u64("keyspace_hits");
        let keyspace_misses = self.get_u64("keyspace_misses");
        let used_memory = self.get_u64("used_memory");
        let maxmemory = self.get_u64("maxmemory");

        let hit_rate = if keyspace_hits + keyspace_misses > 0 {
            round2(keyspace_hits as f64 / (keyspace_hits + keyspace_misses) as f64 * 100.0)
        } else {
            0.0
        };

        // An unset memory limit means no memory pressure, not an error.
        let memory_usage_percent = if maxmemory > 0 {
            round2(used_memory as f64 / maxmemory as f64 * 100.0)
        } else {
            0.0
        };

        MetricSnapshot {
            used_memory,
            used_memory_peak: self.get_u64("used_memory_peak"),
            used_memory_rss: self.get_u64("used_memory_rss"),
            maxmemory,
            mem_fragmentation_ratio: self.get_f64("mem_fragmentation_ratio"),
            evicted_keys: self.get_u64("evicted_keys"),
            connected_clients: self.get_u64("connected_clients"),
            blocked_clients: self.get_u64("blocked_clients"),
            rejected_connections: self.get_u64("rejected_connections"),
            total_connections_received: self.get_u64("total_connections_received"),
            total_commands_processed: self.get_u64("total_commands_processed"),
            instantaneous_ops_per_sec: self.get_u64("instantaneous_ops_per_sec"),
            keyspace_hits,
            keyspace_misses,
            role: self.get_str("role", "unknown"),
            connected_replicas: self.get_u64("connected_slaves"),
            master_link_status: self.get_str("master_link_status", "n/a"),
            rdb_last_bgsave_status: self.get_str("rdb_last_bgsave_status", "ok"),
            rdb_changes_since_last_save: self.get_u64("rdb_changes_since_last_save"),
            aof_enabled: self.get_flag("aof_enabled"),
            aof_last_bgrewrite_status: self.get_str("aof_last_bgrewrite_status", "ok"),
            server_version: self.get_str("redis_version", "unknown"),
            uptime_in_seconds: self.get_u64("uptime_in_seconds"),
            cluster_enabled: self.get_flag("cluster_enabled"),
            hit_rate,
            memory_usage_percent,
            collected_at,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_crlf() {
        let raw = "# Server\r\nredis_version:7.2.4\r\nuptime_in_seconds:360\r\n\r\n# Memory\r\nused_memory:1048576\r\n";
        let report = InfoReport::parse(raw);
        assert_eq!(report.get_str("redis_version", "unknown"), "7.2.4");
        assert_eq!(report.get_u64("uptime_in_seconds"), 360);
        assert_eq!(report.get_u64("used_memory"), 1_048_576);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let snapshot = InfoReport::parse("").project(Utc::now());
        assert_eq!(snapshot.used_memory, 0);
        assert_eq!(snapshot.role, "unknown");
        assert_eq!(snapshot.master_link_status, "n/a");
        assert_eq!(snapshot.rdb_last_bgsave_status, "ok");
        assert_eq!(snapshot.aof_last_bgrewrite_status, "ok");
        assert_eq!(snapshot.server_version, "unknown");
        assert!(!snapshot.aof_enabled);
    }

    #[test]
    fn malformed_numerics_default_instead_of_erroring() {
        let report = InfoReport::parse("used_memory:not-a-number\nmem_fragmentation_ratio:???\n");
        assert_eq!(report.get_u64("used_memory"), 0);
        assert_eq!(report.get_f64("mem_fragmentation_ratio"), 0.0);
    }

    #[test]
    fn hit_rate_zero_without_keyspace_traffic() {
        let snapshot = InfoReport::parse("keyspace_hits:0\nkeyspace_misses:0\n").project(Utc::now());
        assert_eq!(snapshot.hit_rate, 0.0);
    }

    #[test]
    fn hit_rate_rounded_to_two_decimals() {
        let snapshot = InfoReport::parse("keyspace_hits:1\nkeyspace_misses:2\n").project(Utc::now());
        assert_eq!(snapshot.hit_rate, 33.33);
    }

    #[test]
    fn memory_percent_zero_when_no_limit_configured() {
        let snapshot = InfoReport::parse("used_memory:950\nmaxmemory:0\n").project(Utc::now());
        assert_eq!(snapshot.memory_usage_percent, 0.0);
    }

    #[test]
    fn memory_percent_computed_against_limit() {
        let snapshot = InfoReport::parse("used_memory:950\nmaxmemory:1000\n").project(Utc::now());
        assert_eq!(snapshot.memory_usage_percent, 95.0);
    }

    #[test]
    fn flags_parsed_from_zero_one() {
        let report = InfoReport::parse("aof_enabled:1\ncluster_enabled:0\n");
        assert!(report.get_flag("aof_enabled"));
        assert!(!report.get_flag("cluster_enabled"));
    }
}
