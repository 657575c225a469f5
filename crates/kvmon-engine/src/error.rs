use kvmon_collector::CollectError;
use std::time::Duration;

/// Errors surfaced by the engine façade.
///
/// Anything originating inside the scheduled loop is recovered locally and
/// never reaches this type; these variants cover direct, caller-invoked
/// operations only.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// The connection to the monitored server could not be established or
    /// probed. Surfaced from `connect`/`start_monitoring`; not retried.
    #[error("monitor: connection failed: {0}")]
    Connection(String),

    /// A single ad-hoc sample attempt failed.
    #[error("monitor: collection failed: {0}")]
    Collection(#[from] CollectError),

    /// An operation that needs an established connection was called without
    /// one.
    #[error("monitor: not connected")]
    NotConnected,

    /// Configuration mutation was requested while the polling loop is
    /// running; thresholds must not change mid-evaluation.
    #[error("monitor: cannot update configuration while monitoring is running")]
    Running,

    /// The polling loop did not exit within the stop timeout and was
    /// aborted.
    #[error("monitor: polling loop did not stop within {0:?}; aborted")]
    StopTimeout(Duration),
}
