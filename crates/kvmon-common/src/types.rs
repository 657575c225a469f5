use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert severity level, ordered from lowest to highest.
///
/// # Examples
///
/// ```
/// use kvmon_common::types::AlertLevel;
///
/// let level: AlertLevel = "warning".parse().unwrap();
/// assert_eq!(level, AlertLevel::Warning);
/// assert_eq!(level.to_string(), "warning");
/// assert!(AlertLevel::Critical > AlertLevel::Info);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Info => write!(f, "info"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for AlertLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "info" => Ok(AlertLevel::Info),
            "warning" => Ok(AlertLevel::Warning),
            "critical" => Ok(AlertLevel::Critical),
            _ => Err(format!("unknown alert level: {s}")),
        }
    }
}

/// Alert category constants. Categories are short free-form strings; these
/// cover every category the built-in rule set produces.
pub mod category {
    pub const MEMORY: &str = "memory";
    pub const CONNECTION: &str = "connection";
    pub const REPLICATION: &str = "replication";
    pub const PERSISTENCE: &str = "persistence";
}

/// A single leveled alert produced by the rule evaluator.
///
/// Alerts are immutable once created. The same underlying condition re-fires
/// on every evaluation while it persists; there is no suppression window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub level: AlertLevel,
    pub category: String,
    pub message: String,
    /// Copy of the snapshot that triggered the alert. `None` only for the
    /// unreachable-server alert, where no snapshot could be collected.
    pub snapshot: Option<MetricSnapshot>,
}

impl Alert {
    pub fn new(
        level: AlertLevel,
        category: &str,
        message: impl Into<String>,
        snapshot: Option<MetricSnapshot>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            category: category.to_string(),
            message: message.into(),
            snapshot,
        }
    }
}

/// Connection state of the engine towards the monitored server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
    /// Connection attempt failed; carries the upstream error detail.
    Error(String),
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Error(detail) => write!(f, "error: {detail}"),
        }
    }
}

/// One point-in-time set of server health metrics.
///
/// A fixed typed record rather than an open-ended mapping: every field is
/// defaulted when the upstream status report omits it, so downstream rules
/// never deal with missing keys. Counters default to 0, ratios to 0.0, and
/// string statuses to their quiescent values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    // Memory
    pub used_memory: u64,
    pub used_memory_peak: u64,
    pub used_memory_rss: u64,
    pub maxmemory: u64,
    pub mem_fragmentation_ratio: f64,
    pub evicted_keys: u64,

    // Clients
    pub connected_clients: u64,
    pub blocked_clients: u64,
    pub rejected_connections: u64,

    // Stats
    pub total_connections_received: u64,
    pub total_commands_processed: u64,
    pub instantaneous_ops_per_sec: u64,
    pub keyspace_hits: u64,
    pub keyspace_misses: u64,

    // Replication
    pub role: String,
    pub connected_replicas: u64,
    pub master_link_status: String,

    // Persistence
    pub rdb_last_bgsave_status: String,
    pub rdb_changes_since_last_save: u64,
    pub aof_enabled: bool,
    pub aof_last_bgrewrite_status: String,

    // Server
    pub server_version: String,
    pub uptime_in_seconds: u64,
    pub cluster_enabled: bool,

    // Derived
    /// hits / (hits + misses) * 100, rounded to 2 decimals; 0 when no
    /// keyspace traffic has been observed.
    pub hit_rate: f64,
    /// used_memory / maxmemory * 100, rounded to 2 decimals; 0 when no
    /// memory limit is configured (an unset limit means no pressure).
    pub memory_usage_percent: f64,

    pub collected_at: DateTime<Utc>,
}

impl Default for MetricSnapshot {
    fn default() -> Self {
        Self {
            used_memory: 0,
            used_memory_peak: 0,
            used_memory_rss: 0,
            maxmemory: 0,
            mem_fragmentation_ratio: 0.0,
            evicted_keys: 0,
            connected_clients: 0,
            blocked_clients: 0,
            rejected_connections: 0,
            total_connections_received: 0,
            total_commands_processed: 0,
            instantaneous_ops_per_sec: 0,
            keyspace_hits: 0,
            keyspace_misses: 0,
            role: "unknown".to_string(),
            connected_replicas: 0,
            master_link_status: "n/a".to_string(),
            rdb_last_bgsave_status: "ok".to_string(),
            rdb_changes_since_last_save: 0,
            aof_enabled: false,
            aof_last_bgrewrite_status: "ok".to_string(),
            server_version: "unknown".to_string(),
            uptime_in_seconds: 0,
            cluster_enabled: false,
            hit_rate: 0.0,
            memory_usage_percent: 0.0,
            collected_at: Utc::now(),
        }
    }
}
