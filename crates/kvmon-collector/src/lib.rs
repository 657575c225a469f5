//! Metric collection for the kvmon engine.
//!
//! A [`ServerProbe`] is the connection handle towards the monitored
//! key-value server: a connectivity probe plus a single "fetch status
//! report" read. [`sample`] turns one such read into a fully populated
//! [`MetricSnapshot`], defaulting every field the upstream report omits.
//! Retry policy belongs to the caller; a failed read is surfaced as a
//! [`CollectError`] and nothing else.

pub mod client;
pub mod info;

use async_trait::async_trait;
use chrono::Utc;
use kvmon_common::types::MetricSnapshot;
use std::time::Duration;

use info::InfoReport;

/// Errors raised by a single collection attempt.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The underlying server command failed (protocol error, reset, refusal).
    #[error("collect: server command failed: {0}")]
    Command(#[from] redis::RedisError),

    /// The connect or read call did not complete within its timeout.
    #[error("collect: operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Connection handle to the monitored server.
///
/// Implementations must carry their own per-call timeouts so a stuck
/// upstream cannot wedge the polling loop. The trait is the seam for
/// injecting a scripted probe in tests.
#[async_trait]
pub trait ServerProbe: Send + Sync {
    /// Basic connectivity check.
    async fn ping(&self) -> Result<(), CollectError>;

    /// Fetches the flat key-value status report.
    async fn fetch_report(&self) -> Result<InfoReport, CollectError>;
}

/// Performs one collection: fetch the status report and project it into a
/// typed snapshot stamped with the collection time.
///
/// Never fails because a field is missing from the report; fails only when
/// the read call itself errors. Does not retry.
pub async fn sample(probe: &dyn ServerProbe) -> Result<MetricSnapshot, CollectError> {
    let report = probe.fetch_report().await?;
    Ok(report.project(Utc::now()))
}
