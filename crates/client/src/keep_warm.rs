//! Periodic "keep warm" pings.
//!
//! Serverless functions are cold-started after a period of inactivity.
//! [`KeepWarm::spawn`] starts a background task that pings each
//! configured endpoint on a fixed interval until its
//! [`KeepWarmHandle`] is stopped. Ping failures are logged and never end
//! the task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::transport::{ApiRequest, Transport};

/// How long [`KeepWarmHandle::stop`] waits for the task to exit.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeepWarmConfig {
    /// Delay between ping rounds. The first round fires immediately.
    pub interval: Duration,
    /// Endpoint paths to ping each round.
    pub paths: Vec<String>,
}

impl Default for KeepWarmConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            paths: vec!["/image".into(), "/video".into(), "/chat".into()],
        }
    }
}

/// Owner of a running keep-warm task.
pub struct KeepWarmHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl KeepWarmHandle {
    /// Stop the task and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        match tokio::time::timeout(STOP_TIMEOUT, self.task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Keep-warm task ended abnormally"),
            Err(_) => tracing::warn!("Keep-warm task did not stop in time"),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub struct KeepWarm;

impl KeepWarm {
    /// Start pinging in the background.
    pub fn spawn(transport: Arc<dyn Transport>, config: KeepWarmConfig) -> KeepWarmHandle {
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let task = tokio::spawn(async move {
            run(transport.as_ref(), &config, &task_cancel).await;
        });
        KeepWarmHandle { cancel, task }
    }
}

/// Run the ping loop until `cancel` is triggered.
pub async fn run(transport: &dyn Transport, config: &KeepWarmConfig, cancel: &CancellationToken) {
    if config.interval.is_zero() {
        tracing::error!("Keep-warm interval must be non-zero, not starting");
        return;
    }

    tracing::info!(
        interval_secs = config.interval.as_secs(),
        endpoints = config.paths.len(),
        "Keep-warm task started"
    );

    let mut interval = tokio::time::interval(config.interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Keep-warm task stopping");
                break;
            }
            _ = interval.tick() => {
                let warmed = tokio::select! {
                    _ = cancel.cancelled() => break,
                    warmed = ping_all(transport, &config.paths) => warmed,
                };
                tracing::debug!(warmed, total = config.paths.len(), "Keep-warm round complete");
            }
        }
    }
}

/// Ping every path once. Returns how many answered with a 2xx.
pub async fn ping_all(transport: &dyn Transport, paths: &[String]) -> usize {
    let mut warmed = 0;
    for path in paths {
        let request = ApiRequest::post(path.clone(), serde_json::json!({ "warmup": true }));
        match transport.send(request).await {
            Ok(response) if response.is_success() => warmed += 1,
            Ok(response) => {
                tracing::warn!(path = %path, status = response.status, "Keep-warm ping rejected");
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Keep-warm ping failed");
            }
        }
    }
    warmed
}
