//! Periodic probe dispatch.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::alert::Alert;
use crate::probe::correlator::Correlator;

/// Drives [`Correlator::dispatch_probe`] on a fixed interval.
///
/// Publish failures are alerted and the loop keeps going. The first probe
/// goes out one interval after start.
pub struct DispatchLoop {
    correlator: Arc<Correlator>,
    interval: Duration,
}

impl DispatchLoop {
    pub fn new(correlator: Arc<Correlator>, interval: Duration) -> Self {
        Self { correlator, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs_f64(), "Dispatch loop starting");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!(
                        abandoned = self.correlator.pending_count(),
                        "Dispatch loop received shutdown signal, exiting loop"
                    );
                    break;
                }
            }
        }
    }

    async fn tick(&self) {
        if let Err(e) = self.correlator.dispatch_probe().await {
            tracing::error!(error = %e, "Failed to publish probe");
            self.correlator
                .notifier()
                .notify(Alert::new(
                    "Error publishing probe",
                    format!("Error publishing probe: {}", e),
                ))
                .await;
        }
    }
}
