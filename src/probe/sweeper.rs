//! Periodic expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::probe::correlator::Correlator;
use crate::probe::types::monotonic_now;

/// Evicts probes that outlived the timeout, on its own fixed period.
pub struct Sweeper {
    correlator: Arc<Correlator>,
    period: Duration,
}

impl Sweeper {
    pub fn new(correlator: Arc<Correlator>, period: Duration) -> Self {
        Self { correlator, period }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            period_secs = self.period.as_secs_f64(),
            timeout_secs = self.correlator.timeout().as_secs(),
            "Expiry sweeper starting"
        );

        let mut ticker = time::interval_at(time::Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let expired = self.correlator.expire_overdue(monotonic_now()).await;
                    if !expired.is_empty() {
                        tracing::debug!(count = expired.len(), "Sweep evicted probes");
                    }
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
