//! Probe wire payloads and in-memory records.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Correlation key of a dispatched probe: a per-engine sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProbeId(pub u64);

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Payload published into the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeMessage {
    /// Epoch milliseconds at dispatch.
    pub timestamp: i64,
    /// Correlation sequence, echoed back in the callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
}

/// Payload echoed back by the downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallbackPayload {
    /// `timestamp` copied from the originating probe.
    pub timestamp: i64,
    /// `seq` copied from the originating probe, absent for legacy responders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    /// Epoch milliseconds at which the consumer saw the probe.
    pub received: i64,
    /// Latency as computed by the consumer.
    #[serde(default)]
    pub latency_seconds: f64,
}

impl CallbackPayload {
    /// Round-trip latency derived from the two timestamps.
    pub fn latency_secs(&self) -> f64 {
        latency_between(self.timestamp, self.received)
    }
}

/// An outstanding probe. Immutable once stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    pub id: ProbeId,
    /// Value embedded in the payload.
    pub published_timestamp: i64,
    /// Monotonic instant of the successful publish.
    pub dispatched_at: Instant,
}

/// Seconds between two epoch-millisecond timestamps.
///
/// A `received` earlier than `published` (clock skew between the two
/// ends) counts as zero latency.
pub fn latency_between(published_ms: i64, received_ms: i64) -> f64 {
    received_ms.saturating_sub(published_ms).max(0) as f64 / 1000.0
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Monotonic "now" that follows tokio's clock, so paused-time tests see
/// the same timeline as the engine.
pub fn monotonic_now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Render epoch milliseconds for log lines and alert bodies.
pub fn format_millis(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => ms.to_string(),
    }
}
