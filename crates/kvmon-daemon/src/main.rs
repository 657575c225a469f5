mod config;

use anyhow::Result;
use kvmon_common::types::AlertLevel;
use kvmon_engine::Monitor;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("kvmon=info".parse()?))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/daemon.toml".to_string());

    let config = config::DaemonConfig::load(&config_path)?;
    let target = config.monitor.target();
    tracing::info!(target = %target, "kvmon-daemon starting");

    let monitor = Monitor::new(config.monitor);
    monitor.on_alert(|alert| {
        match alert.level {
            AlertLevel::Critical => {
                tracing::error!(category = %alert.category, "ALERT: {}", alert.message)
            }
            AlertLevel::Warning => {
                tracing::warn!(category = %alert.category, "ALERT: {}", alert.message)
            }
            AlertLevel::Info => {
                tracing::info!(category = %alert.category, "ALERT: {}", alert.message)
            }
        }
        Ok(())
    });

    monitor.connect().await?;
    monitor.start_monitoring().await?;

    signal::ctrl_c().await?;
    tracing::info!("Shutting down gracefully");

    if let Err(e) = monitor.stop_monitoring().await {
        tracing::warn!(error = %e, "Polling loop did not stop cleanly");
    }
    monitor.disconnect().await;

    Ok(())
}
