//! Redis-protocol implementation of [`ServerProbe`].

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use std::time::Duration;
use tokio::time::timeout;

use crate::info::InfoReport;
use crate::{CollectError, ServerProbe};

/// Probe backed by a multiplexed connection to the monitored server.
///
/// Every call is wrapped in `command_timeout` so a stuck upstream surfaces
/// as [`CollectError::Timeout`] instead of blocking the caller.
pub struct RedisProbe {
    conn: MultiplexedConnection,
    command_timeout: Duration,
}

impl RedisProbe {
    /// Establishes the connection, bounded by `connect_timeout`.
    pub async fn connect(
        url: &str,
        connect_timeout: Duration,
        command_timeout: Duration,
    ) -> Result<Self, CollectError> {
        let client = redis::Client::open(url)?;
        let conn = timeout(connect_timeout, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| CollectError::Timeout(connect_timeout))??;
        tracing::debug!(timeout_secs = command_timeout.as_secs(), "probe connected");
        Ok(Self {
            conn,
            command_timeout,
        })
    }
}

#[async_trait]
impl ServerProbe for RedisProbe {
    async fn ping(&self) -> Result<(), CollectError> {
        let mut conn = self.conn.clone();
        timeout(
            self.command_timeout,
            redis::cmd("PING").query_async::<_, String>(&mut conn),
        )
        .await
        .map_err(|_| CollectError::Timeout(self.command_timeout))??;
        Ok(())
    }

    async fn fetch_report(&self) -> Result<InfoReport, CollectError> {
        let mut conn = self.conn.clone();
        let raw: String = timeout(
            self.command_timeout,
            redis::cmd("INFO").query_async::<_, String>(&mut conn),
        )
        .await
        .map_err(|_| CollectError::Timeout(self.command_timeout))??;
        Ok(InfoReport::parse(&raw))
    }
}
