//! Alerting subsystem.
//!
//! # Data Flow
//! ```text
//! Correlator / Sweeper / Health Prober / Dispatch loop
//!     → Notifier (subject prefix, logging, metrics)
//!     → AlertSink
//!         → fanout.rs (every configured backend, concurrently)
//!             → slack.rs     (chat webhook)
//!             → pagerduty.rs (Events v2 trigger)
//! ```
//!
//! # Design Decisions
//! - Fire-and-forget: no retry state is kept anywhere in the core
//! - One failing backend never suppresses another
//! - Delivery failures are logged and never escalated

pub mod fanout;
pub mod pagerduty;
pub mod slack;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AlertConfig;
use crate::observability::metrics;

pub use fanout::FanoutSink;
pub use pagerduty::PagerDutySink;
pub use slack::SlackSink;

/// A single notification: short subject plus a human-readable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub subject: String,
    pub body: String,
}

impl Alert {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Errors that can occur while delivering an alert.
#[derive(Debug, Error)]
pub enum AlertError {
    /// The backend could not be reached.
    #[error("{backend} request failed: {source}")]
    Request {
        backend: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The backend answered with a non-2xx status.
    #[error("{backend} returned status {status}")]
    Status { backend: &'static str, status: u16 },

    /// Some fan-out backends failed; the others were still attempted.
    #[error("{failed} of {total} alert backends failed: {}", .errors.join("; "))]
    Partial {
        failed: usize,
        total: usize,
        errors: Vec<String>,
    },
}

/// Destination for alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver one alert. Returns once every backend has been attempted.
    async fn send_alert(&self, alert: &Alert) -> Result<(), AlertError>;
}

/// Sink used when no backend is configured: alerts only reach the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn send_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        tracing::warn!(subject = %alert.subject, body = %alert.body, "Alert (no backend configured)");
        Ok(())
    }
}

/// Front door used by the engine to raise alerts.
///
/// Applies the configured subject prefix, logs, and swallows delivery
/// failures after logging them.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn AlertSink>,
    subject_prefix: Option<String>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self {
            sink,
            subject_prefix: None,
        }
    }

    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = Some(prefix.into());
        self
    }

    /// Build the notifier and its backends from configuration.
    pub fn from_config(config: &AlertConfig, client: reqwest::Client) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        let mut backends: Vec<Arc<dyn AlertSink>> = Vec::new();

        if let Some(url) = &config.slack_webhook_url {
            backends.push(Arc::new(
                SlackSink::new(client.clone(), url.clone()).with_timeout(timeout),
            ));
        }
        if let Some(key) = &config.pagerduty_routing_key {
            backends.push(Arc::new(
                PagerDutySink::new(
                    client.clone(),
                    config.pagerduty_url.clone(),
                    key.clone(),
                    config.source.clone(),
                )
                .with_timeout(timeout),
            ));
        }

        let sink: Arc<dyn AlertSink> = if backends.is_empty() {
            tracing::warn!("No alert backend configured, alerts will only be logged");
            Arc::new(LogSink)
        } else {
            tracing::info!(backends = backends.len(), "Alert backends configured");
            Arc::new(FanoutSink::new(backends))
        };

        let notifier = Self::new(sink);
        match &config.subject_prefix {
            Some(prefix) => notifier.with_subject_prefix(prefix.clone()),
            None => notifier,
        }
    }

    /// Raise an alert. Delivery failures are logged, never returned.
    pub async fn notify(&self, alert: Alert) {
        let alert = match &self.subject_prefix {
            Some(prefix) => Alert {
                subject: format!("{} {}", prefix, alert.subject),
                body: alert.body,
            },
            None => alert,
        };

        tracing::info!(subject = %alert.subject, "Raising alert");
        match self.sink.send_alert(&alert).await {
            Ok(()) => metrics::record_alert(true),
            Err(e) => {
                metrics::record_alert(false);
                tracing::error!(subject = %alert.subject, error = %e, "Alert delivery failed");
            }
        }
    }
}
