//! Chat webhook backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::alert::{Alert, AlertError, AlertSink};

const BACKEND: &str = "slack";

#[derive(Serialize)]
struct WebhookMessage<'a> {
    text: &'a str,
}

/// Posts `{"text": "<subject>: <body>"}` to an incoming-webhook URL.
pub struct SlackSink {
    client: reqwest::Client,
    webhook_url: String,
    timeout: Duration,
}

impl SlackSink {
    pub fn new(client: reqwest::Client, webhook_url: String) -> Self {
        Self {
            client,
            webhook_url,
            timeout: Duration::from_secs(10),
        }
    }

    /// Bound each delivery attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AlertSink for SlackSink {
    async fn send_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        let text = format!("{}: {}", alert.subject, alert.body);
        let response = self
            .client
            .post(&self.webhook_url)
            .timeout(self.timeout)
            .json(&WebhookMessage { text: &text })
            .send()
            .await
            .map_err(|source| AlertError::Request { backend: BACKEND, source })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AlertError::Status {
                backend: BACKEND,
                status: status.as_u16(),
            });
        }

        tracing::debug!(subject = %alert.subject, "Slack alert delivered");
        Ok(())
    }
}
