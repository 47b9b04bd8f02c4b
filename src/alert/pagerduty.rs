//! PagerDuty Events v2 backend.
//!
//! Every alert becomes a `trigger` event with `error` severity. Deduplication
//! is left to PagerDuty; no dedup key is sent.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::alert::{Alert, AlertError, AlertSink};

const BACKEND: &str = "pagerduty";

#[derive(Serialize)]
struct EventPayload<'a> {
    summary: &'a str,
    source: &'a str,
    severity: &'static str,
    timestamp: String,
    custom_details: CustomDetails<'a>,
}

#[derive(Serialize)]
struct CustomDetails<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct TriggerEvent<'a> {
    routing_key: &'a str,
    event_action: &'static str,
    payload: EventPayload<'a>,
}

/// Raises PagerDuty incidents through the Events v2 enqueue endpoint.
pub struct PagerDutySink {
    client: reqwest::Client,
    events_url: String,
    routing_key: String,
    source: String,
    timeout: Duration,
}

impl PagerDutySink {
    pub fn new(client: reqwest::Client, events_url: String, routing_key: String, source: String) -> Self {
        Self {
            client,
            events_url,
            routing_key,
            source,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl AlertSink for PagerDutySink {
    async fn send_alert(&self, alert: &Alert) -> Result<(), AlertError> {
        let event = TriggerEvent {
            routing_key: &self.routing_key,
            event_action: "trigger",
            payload: EventPayload {
                summary: &alert.subject,
                source: &self.source,
                severity: "error",
                timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                custom_details: CustomDetails { body: &alert.body },
            },
        };

        let response = self
            .client
            .post(&self.events_url)
            .timeout(self.timeout)
            .json(&event)
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

        tracing::debug!(subject = %alert.subject, "PagerDuty event enqueued");
        Ok(())
    }
}
