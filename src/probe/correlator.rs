//! Pending-probe correlation engine.
//!
//! # Responsibilities
//! - Assign correlation keys and publish probes
//! - Track successfully published probes in the pending set
//! - Resolve callbacks against the pending set and judge latency
//! - Evict probes that outlived the timeout
//!
//! # Design Decisions
//! - One mutex guards the pending set; every lookup-then-mutate sequence
//!   (insert, resolve, evict) runs inside a single critical section
//! - Removal is the only ownership transfer: whoever removes a probe is the
//!   only path allowed to act on it
//! - Alerts and network calls happen after the lock is released

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::alert::{Alert, Notifier};
use crate::config::ProbeConfig;
use crate::observability::metrics;
use crate::probe::types::{
    format_millis, monotonic_now, now_millis, CallbackPayload, Probe, ProbeId, ProbeMessage,
};
use crate::transport::publisher::{PublishError, Publisher};

/// Errors returned by [`Correlator::dispatch_probe`].
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("failed to publish probe: {0}")]
    Publish(#[from] PublishError),
}

/// Outcome of matching one callback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// Probe found, latency at or below the threshold.
    Healthy { probe: Probe, latency_secs: f64 },
    /// Probe found, latency above the threshold. One alert was raised.
    LatencyExceeded { probe: Probe, latency_secs: f64 },
    /// No pending probe matched: duplicate, stale, swept, or foreign.
    Unmatched,
}

impl Resolution {
    pub fn outcome(&self) -> &'static str {
        match self {
            Resolution::Healthy { .. } => "healthy",
            Resolution::LatencyExceeded { .. } => "late",
            Resolution::Unmatched => "unmatched",
        }
    }
}

/// Owner of the pending set. Shared via `Arc` by the dispatch loop, the
/// sweeper and the inbound handlers.
pub struct Correlator {
    pending: Mutex<HashMap<ProbeId, Probe>>,
    next_seq: AtomicU64,
    publisher: Arc<dyn Publisher>,
    notifier: Notifier,
    latency_threshold_secs: f64,
    timeout: Duration,
}

impl Correlator {
    pub fn new(publisher: Arc<dyn Publisher>, notifier: Notifier, config: &ProbeConfig) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            next_seq: AtomicU64::new(1),
            publisher,
            notifier,
            latency_threshold_secs: config.latency_threshold_secs,
            timeout: config.timeout(),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn latency_threshold_secs(&self) -> f64 {
        self.latency_threshold_secs
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Number of probes awaiting resolution.
    pub fn pending_count(&self) -> usize {
        self.lock().len()
    }

    /// Copy of the pending set, oldest first.
    pub fn snapshot(&self) -> Vec<Probe> {
        let mut probes: Vec<Probe> = self.lock().values().copied().collect();
        probes.sort_by_key(|p| p.id);
        probes
    }

    /// Publish a probe stamped with the current time and start tracking it.
    ///
    /// The probe enters the pending set only if the publish succeeded.
    pub async fn dispatch_probe(&self) -> Result<ProbeId, DispatchError> {
        self.dispatch(now_millis(), None).await
    }

    /// Like [`dispatch_probe`](Self::dispatch_probe) with explicit clocks.
    pub async fn dispatch_probe_at(
        &self,
        published_timestamp: i64,
        dispatched_at: Instant,
    ) -> Result<ProbeId, DispatchError> {
        self.dispatch(published_timestamp, Some(dispatched_at)).await
    }

    async fn dispatch(
        &self,
        published_timestamp: i64,
        dispatched_at: Option<Instant>,
    ) -> Result<ProbeId, DispatchError> {
        let id = ProbeId(self.next_seq.fetch_add(1, Ordering::Relaxed));
        let message = ProbeMessage {
            timestamp: published_timestamp,
            seq: Some(id.0),
        };

        if let Err(e) = self.publisher.publish(&message).await {
            metrics::record_dispatch(false);
            return Err(e.into());
        }

        let probe = Probe {
            id,
            published_timestamp,
            dispatched_at: dispatched_at.unwrap_or_else(monotonic_now),
        };
        let pending = {
            let mut pending = self.lock();
            pending.insert(id, probe);
            pending.len()
        };
        metrics::record_dispatch(true);
        metrics::record_pending(pending);

        tracing::info!(
            probe = %id,
            timestamp = published_timestamp,
            published = %format_millis(published_timestamp),
            pending,
            "Published probe"
        );
        Ok(id)
    }

    /// Match a callback against the pending set.
    ///
    /// Unknown, duplicate and already-swept callbacks are logged and
    /// otherwise ignored. A matched probe whose latency exceeds the threshold
    /// raises exactly one alert. A callback without a usable `received`
    /// stamp is rejected before the lookup, so its probe stays pending.
    pub async fn resolve_callback(&self, payload: &CallbackPayload) -> Resolution {
        if payload.received <= 0 {
            tracing::warn!(
                timestamp = payload.timestamp,
                received = payload.received,
                "Callback has no usable receive time, ignoring"
            );
            metrics::record_callback(Resolution::Unmatched.outcome(), None);
            return Resolution::Unmatched;
        }

        let (taken, pending) = {
            let mut pending = self.lock();
            let taken = take_matching(&mut pending, payload);
            (taken, pending.len())
        };
        metrics::record_pending(pending);

        let Some(probe) = taken else {
            tracing::warn!(
                timestamp = payload.timestamp,
                seq = ?payload.seq,
                "Callback does not match a pending probe, ignoring"
            );
            metrics::record_callback(Resolution::Unmatched.outcome(), None);
            return Resolution::Unmatched;
        };

        let latency_secs = payload.latency_secs();
        tracing::info!(
            probe = %probe.id,
            published = %format_millis(payload.timestamp),
            received = %format_millis(payload.received),
            latency_secs,
            reported_latency_secs = payload.latency_seconds,
            "Received callback"
        );

        let resolution = if latency_secs > self.latency_threshold_secs {
            tracing::warn!(
                probe = %probe.id,
                latency_secs,
                threshold_secs = self.latency_threshold_secs,
                "Latency exceeds threshold"
            );
            self.notifier
                .notify(Alert::new(
                    "High latency detected",
                    format!(
                        "High latency detected: {:.2} sec for timestamp {} ({}), threshold {} sec",
                        latency_secs,
                        probe.published_timestamp,
                        format_millis(probe.published_timestamp),
                        self.latency_threshold_secs
                    ),
                ))
                .await;
            Resolution::LatencyExceeded { probe, latency_secs }
        } else {
            tracing::debug!(probe = %probe.id, latency_secs, "Latency within acceptable range");
            Resolution::Healthy { probe, latency_secs }
        };

        metrics::record_callback(resolution.outcome(), Some(latency_secs));
        resolution
    }

    /// Evict every probe dispatched before `now - timeout` and raise one
    /// alert per evicted probe. Returns the evicted probes, oldest first.
    pub async fn expire_overdue(&self, now: Instant) -> Vec<Probe> {
        let Some(cutoff) = now.checked_sub(self.timeout) else {
            return Vec::new();
        };

        let (mut expired, pending) = {
            let mut pending = self.lock();
            let mut expired = Vec::new();
            pending.retain(|_, probe| {
                if probe.dispatched_at < cutoff {
                    expired.push(*probe);
                    false
                } else {
                    true
                }
            });
            (expired, pending.len())
        };

        if expired.is_empty() {
            return expired;
        }
        expired.sort_by_key(|p| p.id);
        metrics::record_pending(pending);
        metrics::record_expired(expired.len());

        let timeout_secs = self.timeout.as_secs();
        for probe in &expired {
            tracing::error!(
                probe = %probe.id,
                timestamp = probe.published_timestamp,
                timeout_secs,
                "No callback received within timeout"
            );
            self.notifier
                .notify(Alert::new(
                    "No callback received",
                    format!(
                        "No callback received within {} seconds for timestamp {} ({}, probe {})",
                        timeout_secs,
                        probe.published_timestamp,
                        format_millis(probe.published_timestamp),
                        probe.id
                    ),
                ))
                .await;
        }

        expired
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<ProbeId, Probe>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Remove and return the probe a callback refers to, if still pending.
///
/// Callbacks carrying a sequence must also agree on the timestamp, which
/// rejects callbacks addressed to a previous process whose sequence numbers
/// overlap ours. Callbacks without a sequence match the oldest pending probe
/// with the same timestamp.
fn take_matching(pending: &mut HashMap<ProbeId, Probe>, payload: &CallbackPayload) -> Option<Probe> {
    let id = match payload.seq {
        Some(seq) => {
            let id = ProbeId(seq);
            match pending.get(&id) {
                Some(probe) if probe.published_timestamp == payload.timestamp => id,
                _ => return None,
            }
        }
        None => pending
            .values()
            .filter(|p| p.published_timestamp == payload.timestamp)
            .min_by_key(|p| (p.dispatched_at, p.id))
            .map(|p| p.id)?,
    };
    pending.remove(&id)
}
