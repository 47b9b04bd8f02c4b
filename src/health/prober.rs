//! Bounded liveness polling.
//!
//! # Responsibilities
//! - Poll the target until it answers 2xx or the wait window closes
//! - Raise a single alert when the window closes without success
//! - Allow only one run at a time per process

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, Instant};

use crate::alert::{Alert, Notifier};
use crate::config::HealthProbeConfig;
use crate::health::state::{describe_window, ProbeOutcome, ProbeRun, ProberState};
use crate::observability::metrics;

pub struct HealthProber {
    client: reqwest::Client,
    target: String,
    poll_interval: Duration,
    total_wait: Duration,
    request_timeout: Duration,
    notifier: Notifier,
    running: AtomicBool,
}

/// Clears the running flag when a run ends, including on panic.
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl HealthProber {
    pub fn new(client: reqwest::Client, target: String, notifier: Notifier) -> Self {
        let defaults = HealthProbeConfig::default();
        Self {
            client,
            target,
            poll_interval: defaults.poll_interval(),
            total_wait: defaults.total_wait(),
            request_timeout: defaults.request_timeout(),
            notifier,
            running: AtomicBool::new(false),
        }
    }

    /// Build from configuration; `None` when no target is configured.
    pub fn from_config(
        client: reqwest::Client,
        config: &HealthProbeConfig,
        notifier: Notifier,
    ) -> Option<Self> {
        let target = config.target.clone()?;
        Some(
            Self::new(client, target, notifier).with_timing(
                config.poll_interval(),
                config.total_wait(),
                config.request_timeout(),
            ),
        )
    }

    pub fn with_timing(mut self, poll_interval: Duration, total_wait: Duration, request_timeout: Duration) -> Self {
        self.poll_interval = poll_interval;
        self.total_wait = total_wait;
        self.request_timeout = request_timeout;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one bounded polling loop, unless one is already in progress.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> ProbeOutcome {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::info!(url = %self.target, "Health probe already running, coalescing event");
            return ProbeOutcome::AlreadyRunning;
        }
        let _guard = RunGuard(&self.running);

        tracing::info!(
            url = %self.target,
            interval_secs = self.poll_interval.as_secs_f64(),
            window = %describe_window(self.total_wait),
            "Checking target health"
        );

        let start = Instant::now();
        let mut attempts = 0u32;
        let mut state = ProberState::Polling;

        while !state.is_terminal() {
            if start.elapsed() >= self.total_wait {
                state = ProberState::TimeoutExit;
                break;
            }

            attempts += 1;
            if self.poll_once().await {
                state = ProberState::HealthyExit;
                break;
            }

            tracing::info!(
                url = %self.target,
                attempt = attempts,
                retry_in_secs = self.poll_interval.as_secs_f64(),
                "Target response failed or not 2xx, retrying"
            );
            tokio::select! {
                _ = time::sleep(self.poll_interval) => {}
                _ = shutdown.recv() => {
                    state = ProberState::Cancelled;
                }
            }
        }

        let run = ProbeRun {
            state,
            attempts,
            elapsed: start.elapsed(),
        };
        metrics::record_health_probe(state.as_str());

        match state {
            ProberState::HealthyExit => {
                tracing::info!(url = %self.target, attempts, "Target responded successfully");
            }
            ProberState::TimeoutExit => {
                let window = describe_window(self.total_wait);
                tracing::error!(url = %self.target, attempts, window = %window, "Target unresponsive");
                self.notifier
                    .notify(Alert::new(
                        "Target unresponsive",
                        format!("Target {} unresponsive for {}", self.target, window),
                    ))
                    .await;
            }
            ProberState::Cancelled => {
                tracing::info!(url = %self.target, "Health probe cancelled by shutdown");
            }
            ProberState::Polling => {}
        }

        ProbeOutcome::Completed(run)
    }

    async fn poll_once(&self) -> bool {
        match self
            .client
            .get(&self.target)
            .header("user-agent", "pubsub-latency-monitor-health-check")
            .timeout(self.request_timeout)
            .send()
            .await
        {
            Ok(response) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(url = %self.target, status = %response.status(), "Health check failed: non-success status");
                }
                success
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(url = %self.target, "Health check failed: timeout");
                false
            }
            Err(e) => {
                tracing::warn!(url = %self.target, error = %e, "Health check failed: connection error");
                false
            }
        }
    }
}
