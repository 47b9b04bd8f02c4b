//! Echo side of the round trip.
//!
//! Receives probes delivered by the channel and answers each with a
//! callback to the monitor, carrying the original timestamp and sequence.

use crate::alert::{Alert, Notifier};
use crate::config::{ProbeConfig, RelayConfig};
use crate::probe::types::{format_millis, latency_between, now_millis, CallbackPayload, ProbeMessage};

pub struct Relay {
    client: reqwest::Client,
    callback_url: Option<String>,
    notifier: Notifier,
    latency_threshold_secs: f64,
    alert_on_latency: bool,
}

impl Relay {
    pub fn new(
        client: reqwest::Client,
        config: &RelayConfig,
        probe: &ProbeConfig,
        notifier: Notifier,
    ) -> Self {
        if config.callback_url.is_none() {
            tracing::warn!("Callback URL is not set, probes will not be echoed");
        }
        Self {
            client,
            callback_url: config.callback_url.clone(),
            notifier,
            latency_threshold_secs: probe.latency_threshold_secs,
            alert_on_latency: config.alert_on_latency,
        }
    }

    /// Answer a probe received now.
    pub async fn echo(&self, message: &ProbeMessage) -> CallbackPayload {
        self.echo_at(message, now_millis()).await
    }

    /// Answer a probe received at `received` (epoch milliseconds).
    pub async fn echo_at(&self, message: &ProbeMessage, received: i64) -> CallbackPayload {
        let latency_seconds = latency_between(message.timestamp, received);
        let callback = CallbackPayload {
            timestamp: message.timestamp,
            seq: message.seq,
            received,
            latency_seconds,
        };

        tracing::info!(
            published = %format_millis(message.timestamp),
            received = %format_millis(received),
            seq = ?message.seq,
            latency_seconds,
            "Received probe"
        );

        match &self.callback_url {
            Some(url) => self.post_callback(url, &callback).await,
            None => tracing::warn!("Callback URL is not set, skipping callback"),
        }

        if self.alert_on_latency && latency_seconds > self.latency_threshold_secs {
            self.notifier
                .notify(Alert::new(
                    "High delivery latency detected",
                    format!(
                        "High delivery latency detected: {:.2} seconds for timestamp {}",
                        latency_seconds, message.timestamp
                    ),
                ))
                .await;
        }

        callback
    }

    async fn post_callback(&self, url: &str, callback: &CallbackPayload) {
        match self.client.post(url).json(callback).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(url = %url, "Callback delivered");
            }
            Ok(response) => {
                tracing::warn!(url = %url, status = %response.status(), "Callback rejected");
            }
            Err(e) => {
                tracing::warn!(url = %url, error = %e, "Callback delivery failed");
            }
        }
    }
}
