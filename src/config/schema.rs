//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration for the latency monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Which role this process plays.
    pub mode: Mode,

    /// Inbound HTTP listener (callbacks and channel deliveries).
    pub listener: ListenerConfig,

    /// Outbound probe publishing.
    pub transport: TransportConfig,

    /// Probe cadence, latency threshold and expiry.
    pub probe: ProbeConfig,

    /// Echo side settings (relay role).
    pub relay: RelayConfig,

    /// Bounded liveness polling for lifecycle events.
    pub health_probe: HealthProbeConfig,

    /// Notification backends.
    pub alerts: AlertConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Process role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Dispatch probes, sweep expired ones, and receive callbacks.
    #[default]
    Monitor,
    /// Echo probes back as callbacks and handle lifecycle events.
    Relay,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Monitor => "monitor",
            Mode::Relay => "relay",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monitor" | "server" => Ok(Mode::Monitor),
            "relay" | "lambda" => Ok(Mode::Relay),
            other => Err(format!(
                "unknown mode '{}', expected 'monitor' or 'relay'",
                other
            )),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 64 * 1024,
            request_timeout_secs: 30,
        }
    }
}

/// Pub/sub publishing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TransportConfig {
    /// HTTP endpoint that accepts probe payloads for the channel.
    pub topic_url: Option<String>,

    /// Optional bearer token sent with every publish.
    pub auth_token: Option<String>,

    /// Publish request timeout in seconds.
    pub publish_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            topic_url: None,
            auth_token: None,
            publish_timeout_secs: 10,
        }
    }
}

/// Probe engine configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Seconds between probe dispatches.
    pub dispatch_interval_secs: u64,

    /// Round-trip latency above this many seconds raises an alert.
    pub latency_threshold_secs: f64,

    /// Seconds without a callback before a probe is considered lost.
    pub timeout_secs: u64,

    /// Seconds between expiry sweeps.
    pub sweep_interval_secs: u64,
}

impl ProbeConfig {
    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_secs(self.dispatch_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            dispatch_interval_secs: 30,
            latency_threshold_secs: 10.0,
            timeout_secs: 20,
            sweep_interval_secs: 5,
        }
    }
}

/// Relay (echo side) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Where to POST callbacks for received probes.
    pub callback_url: Option<String>,

    /// Alert on one-way delivery latency above the probe threshold.
    pub alert_on_latency: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            callback_url: None,
            alert_on_latency: true,
        }
    }
}

/// Health prober configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthProbeConfig {
    /// URL polled when a lifecycle event arrives. Disabled when unset.
    pub target: Option<String>,

    /// Seconds between polls.
    pub poll_interval_secs: u64,

    /// Total minutes to keep polling before declaring the target down.
    pub wait_minutes: u64,

    /// Timeout for a single poll in seconds.
    pub request_timeout_secs: u64,
}

impl HealthProbeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn total_wait(&self) -> Duration {
        Duration::from_secs(self.wait_minutes * 60)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for HealthProbeConfig {
    fn default() -> Self {
        Self {
            target: None,
            poll_interval_secs: 10,
            wait_minutes: 5,
            request_timeout_secs: 5,
        }
    }
}

/// Alert backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Chat webhook receiving `{"text": ...}` posts.
    pub slack_webhook_url: Option<String>,

    /// PagerDuty Events v2 routing key.
    pub pagerduty_routing_key: Option<String>,

    /// PagerDuty Events v2 enqueue endpoint.
    pub pagerduty_url: String,

    /// Source name reported to paging backends.
    pub source: String,

    /// Prepended to every alert subject when set.
    pub subject_prefix: Option<String>,

    /// Per-backend delivery timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            slack_webhook_url: None,
            pagerduty_routing_key: None,
            pagerduty_url: "https://events.pagerduty.com/v2/enqueue".to_string(),
            source: "pubsub-latency-monitor".to_string(),
            subject_prefix: None,
            timeout_secs: 10,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
