use kvmon_alert::evaluator::HealthEvaluator;
use kvmon_alert::Thresholds;
use kvmon_collector::client::RedisProbe;
use kvmon_collector::ServerProbe;
use kvmon_common::types::{Alert, ConnectionStatus, MetricSnapshot};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::MonitorConfig;
use crate::error::MonitorError;
use crate::state::{AnalysisContext, MonitorState, StatusSummary};

/// Bound on how long `stop_monitoring` waits for the loop to exit before
/// aborting it.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Alert subscriber. Failures are caught and logged per-callback; they
/// never affect other subscribers or the polling loop.
pub type AlertCallback = Box<dyn Fn(&Alert) -> anyhow::Result<()> + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The engine façade: owns the connection to one monitored server, the
/// background polling loop, and the bounded monitoring state.
///
/// Lifetime is owned by the caller; construct one at service start and pass
/// it by reference to all consumers. All mutations of the monitoring state
/// happen under a single lock, and network calls are never issued while
/// holding it — results are computed outside and committed under the lock.
pub struct Monitor {
    config: Mutex<MonitorConfig>,
    state: Arc<Mutex<MonitorState>>,
    /// Shared with the polling loop, which reads it fresh on every tick so
    /// a reconnect takes effect without a stop/start cycle.
    probe: Arc<Mutex<Option<Arc<dyn ServerProbe>>>>,
    callbacks: Arc<Mutex<Vec<AlertCallback>>>,
    evaluator: Arc<HealthEvaluator>,
    is_running: Arc<AtomicBool>,
    stop_tx: Mutex<Option<watch::Sender<bool>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Monitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config: Mutex::new(config),
            state: Arc::new(Mutex::new(MonitorState::new())),
            probe: Arc::new(Mutex::new(None)),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            evaluator: Arc::new(HealthEvaluator::new()),
            is_running: Arc::new(AtomicBool::new(false)),
            stop_tx: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> MonitorConfig {
        lock(&self.config).clone()
    }

    /// Replaces the configuration. Rejected while the polling loop is
    /// running so threshold reads are never torn mid-evaluation; a new
    /// target address takes effect on the next `connect`.
    pub fn set_config(&self, config: MonitorConfig) -> Result<(), MonitorError> {
        if self.is_running.load(Ordering::SeqCst) {
            return Err(MonitorError::Running);
        }
        *lock(&self.config) = config;
        Ok(())
    }

    /// Registers an alert subscriber, notified synchronously as each alert
    /// fires from the polling loop.
    pub fn on_alert<F>(&self, callback: F)
    where
        F: Fn(&Alert) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        lock(&self.callbacks).push(Box::new(callback));
    }

    /// Establishes the connection to the monitored server, tearing down any
    /// existing connection first. Updates the connection status either way.
    /// While the polling loop is running, the new connection is picked up on
    /// the next tick.
    pub async fn connect(&self) -> Result<(), MonitorError> {
        let config = lock(&self.config).clone();
        *lock(&self.probe) = None;

        let probe = match RedisProbe::connect(
            &config.server_url(),
            config.connect_timeout(),
            config.command_timeout(),
        )
        .await
        {
            Ok(probe) => probe,
            Err(e) => return self.fail_connect(&config, e.to_string()),
        };
        if let Err(e) = probe.ping().await {
            return self.fail_connect(&config, e.to_string());
        }

        *lock(&self.probe) = Some(Arc::new(probe));
        lock(&self.state).connection_status = ConnectionStatus::Connected;
        tracing::info!(target = %config.target(), "connected to server");
        Ok(())
    }

    fn fail_connect(&self, config: &MonitorConfig, detail: String) -> Result<(), MonitorError> {
        lock(&self.state).connection_status = ConnectionStatus::Error(detail.clone());
        tracing::error!(target = %config.target(), error = %detail, "connection failed");
        Err(MonitorError::Connection(detail))
    }

    /// Stops the loop if running, releases the connection, and marks the
    /// engine disconnected. Safe to call when already disconnected.
    pub async fn disconnect(&self) {
        if self.is_running.load(Ordering::SeqCst) {
            if let Err(e) = self.stop_monitoring().await {
                tracing::warn!(error = %e, "stopping the loop during disconnect failed");
            }
        }
        *lock(&self.probe) = None;
        lock(&self.state).connection_status = ConnectionStatus::Disconnected;
        tracing::info!("disconnected from server");
    }

    /// Starts the background polling loop. Idempotent: a second start while
    /// running is logged and ignored. Connects implicitly when no
    /// connection is established, failing the start if that fails.
    pub async fn start_monitoring(&self) -> Result<(), MonitorError> {
        if self.is_running.load(Ordering::SeqCst) {
            tracing::warn!("monitoring already running; start ignored");
            return Ok(());
        }

        if lock(&self.probe).is_none() {
            self.connect().await?;
        }
        let config = lock(&self.config).clone();

        // The stop_tx guard serializes the running-check, channel creation,
        // and spawn against concurrent starts and stops; at most one loop
        // can ever be spawned.
        let mut stop_slot = lock(&self.stop_tx);
        if self.is_running.load(Ordering::SeqCst) {
            tracing::warn!("monitoring already running; start ignored");
            return Ok(());
        }
        let (stop_tx, stop_rx) = watch::channel(false);
        self.is_running.store(true, Ordering::SeqCst);

        let ctx = TickContext {
            probe: Arc::clone(&self.probe),
            state: Arc::clone(&self.state),
            callbacks: Arc::clone(&self.callbacks),
            evaluator: Arc::clone(&self.evaluator),
            thresholds: config.thresholds.clone(),
        };
        let handle = tokio::spawn(run_loop(
            ctx,
            config.interval(),
            Arc::clone(&self.is_running),
            stop_rx,
        ));
        *lock(&self.task) = Some(handle);
        *stop_slot = Some(stop_tx);
        drop(stop_slot);

        tracing::info!(
            target = %config.target(),
            interval_secs = config.interval_secs,
            "monitoring started"
        );
        Ok(())
    }

    /// Signals the loop to stop and waits until it has observably exited,
    /// bounded by [`STOP_TIMEOUT`]. No tick runs after this returns.
    pub async fn stop_monitoring(&self) -> Result<(), MonitorError> {
        let Some(stop_tx) = lock(&self.stop_tx).take() else {
            tracing::debug!("stop requested but monitoring is not running");
            return Ok(());
        };
        let _ = stop_tx.send(true);

        let handle = lock(&self.task).take();
        if let Some(mut handle) = handle {
            if tokio::time::timeout(STOP_TIMEOUT, &mut handle).await.is_err() {
                handle.abort();
                self.is_running.store(false, Ordering::SeqCst);
                tracing::warn!(timeout = ?STOP_TIMEOUT, "polling loop did not exit in time; aborted");
                return Err(MonitorError::StopTimeout(STOP_TIMEOUT));
            }
        }
        self.is_running.store(false, Ordering::SeqCst);
        tracing::info!("monitoring stopped");
        Ok(())
    }

    /// Ad-hoc one-shot sample outside the loop's cadence. Does not touch
    /// the rate-rule baseline; a failed sample is surfaced to the caller.
    pub async fn get_metrics(&self) -> Result<MetricSnapshot, MonitorError> {
        let probe = lock(&self.probe).clone().ok_or(MonitorError::NotConnected)?;
        Ok(kvmon_collector::sample(probe.as_ref()).await?)
    }

    /// Ad-hoc sample-and-evaluate. Updates the rate-rule baseline under the
    /// same lock the loop uses, so interleaved ad-hoc and scheduled checks
    /// never double-count deltas. Alerts are returned to the caller; only
    /// loop-driven alerts enter the history and reach subscribers.
    pub async fn check_health(&self) -> Result<Vec<Alert>, MonitorError> {
        let probe = lock(&self.probe).clone().ok_or(MonitorError::NotConnected)?;
        let thresholds = lock(&self.config).thresholds.clone();

        match kvmon_collector::sample(probe.as_ref()).await {
            Ok(snapshot) => {
                let mut state = lock(&self.state);
                let alerts =
                    self.evaluator
                        .evaluate(Some(&snapshot), state.previous.as_ref(), &thresholds);
                state.previous = Some(snapshot);
                Ok(alerts)
            }
            Err(e) => {
                // Baseline keeps pointing at the last completed poll.
                lock(&self.state).record_error(&format!("health check sample failed: {e}"));
                Ok(self.evaluator.evaluate(None, None, &thresholds))
            }
        }
    }

    /// Read-only projection of the current state; never triggers a sample.
    pub fn get_status(&self) -> StatusSummary {
        let config = lock(&self.config).clone();
        let is_running = self.is_running.load(Ordering::SeqCst);
        lock(&self.state).status_summary(is_running, config.target(), config.interval_secs)
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }

    /// The most recent `limit` alerts, oldest first.
    pub fn recent_alerts(&self, limit: usize) -> Vec<Alert> {
        lock(&self.state).alerts.tail(limit)
    }

    /// The most recent `limit` error-log lines, oldest first.
    pub fn recent_errors(&self, limit: usize) -> Vec<String> {
        lock(&self.state).error_log.tail(limit)
    }

    /// Incident bundle for the analysis pipeline; `None` until an alert has
    /// fired.
    pub fn analysis_context(&self) -> Option<AnalysisContext> {
        lock(&self.state).analysis_context()
    }
}

#[cfg(test)]
impl Monitor {
    /// Installs a probe directly, bypassing the network connect path.
    pub(crate) fn inject_probe(&self, probe: Arc<dyn ServerProbe>) {
        *lock(&self.probe) = Some(probe);
        lock(&self.state).connection_status = ConnectionStatus::Connected;
    }

    pub(crate) fn state_handle(&self) -> Arc<Mutex<MonitorState>> {
        Arc::clone(&self.state)
    }

    pub(crate) fn tick_context(&self) -> TickContext {
        TickContext {
            probe: Arc::clone(&self.probe),
            state: Arc::clone(&self.state),
            callbacks: Arc::clone(&self.callbacks),
            evaluator: Arc::clone(&self.evaluator),
            thresholds: lock(&self.config).thresholds.clone(),
        }
    }
}

/// Everything one tick needs, cloned out of the façade at start time so the
/// loop never reaches back into it. The probe slot is shared, not a
/// snapshot: each tick samples whatever connection is current.
pub(crate) struct TickContext {
    pub probe: Arc<Mutex<Option<Arc<dyn ServerProbe>>>>,
    pub state: Arc<Mutex<MonitorState>>,
    pub callbacks: Arc<Mutex<Vec<AlertCallback>>>,
    pub evaluator: Arc<HealthEvaluator>,
    pub thresholds: Thresholds,
}

/// One sample -> evaluate -> record -> notify cycle.
///
/// A collection failure is recorded to the error log and the tick ends
/// without an alert; the loop self-heals on the next interval. The sample
/// runs outside the state lock; evaluation and the baseline swap commit
/// under it in one critical section.
pub(crate) async fn run_tick(ctx: &TickContext) {
    let Some(probe) = lock(&ctx.probe).clone() else {
        tracing::error!("no connection available; skipping tick");
        lock(&ctx.state).record_error("sample failed: not connected");
        return;
    };
    match kvmon_collector::sample(probe.as_ref()).await {
        Ok(snapshot) => {
            let alerts = {
                let mut state = lock(&ctx.state);
                let alerts = ctx.evaluator.evaluate(
                    Some(&snapshot),
                    state.previous.as_ref(),
                    &ctx.thresholds,
                );
                state.record(snapshot, &alerts);
                alerts
            };
            for alert in &alerts {
                tracing::warn!(
                    level = %alert.level,
                    category = %alert.category,
                    "{}",
                    alert.message
                );
                notify_subscribers(&ctx.callbacks, alert);
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "sample failed; retrying next interval");
            lock(&ctx.state).record_error(&format!("sample failed: {e}"));
        }
    }
}

fn notify_subscribers(callbacks: &Mutex<Vec<AlertCallback>>, alert: &Alert) {
    for callback in lock(callbacks).iter() {
        if let Err(e) = callback(alert) {
            tracing::error!(error = %e, "alert callback failed");
        }
    }
}

/// The polling loop: ticks on the configured interval until the stop
/// signal is observed, either mid-wait or at the top of a tick. Clears
/// `is_running` on exit.
async fn run_loop(
    ctx: TickContext,
    interval: Duration,
    is_running: Arc<AtomicBool>,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut tick = tokio::time::interval(interval);
    // A tick that overruns the interval must not trigger a burst of
    // catch-up samples.
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = tick.tick() => {
                if *stop_rx.borrow() {
                    break;
                }
                run_tick(&ctx).await;
            }
            _ = stop_rx.changed() => {
                break;
            }
        }
    }
    is_running.store(false, Ordering::SeqCst);
    tracing::info!("polling loop exited");
}
