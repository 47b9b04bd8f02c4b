//! Probe publishing.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::TransportConfig;
use crate::probe::types::ProbeMessage;

/// Errors that can occur while publishing a probe.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Transport not configured.
    #[error("topic URL not set")]
    NotConfigured,

    /// The endpoint could not be reached or timed out.
    #[error("publish request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint rejected the message.
    #[error("publish rejected with status {0}")]
    Rejected(u16),
}

/// Puts probe payloads onto the monitored channel.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, message: &ProbeMessage) -> Result<(), PublishError>;
}

/// Publishes by POSTing the probe JSON to an HTTP topic endpoint.
pub struct HttpPublisher {
    client: reqwest::Client,
    topic_url: String,
    auth_token: Option<String>,
    timeout: Duration,
}

impl HttpPublisher {
    pub fn new(client: reqwest::Client, topic_url: String) -> Self {
        Self {
            client,
            topic_url,
            auth_token: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &TransportConfig) -> Result<Self, PublishError> {
        let topic_url = config.topic_url.clone().ok_or(PublishError::NotConfigured)?;
        Ok(Self {
            client,
            topic_url,
            auth_token: config.auth_token.clone(),
            timeout: Duration::from_secs(config.publish_timeout_secs),
        })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&self, message: &ProbeMessage) -> Result<(), PublishError> {
        let mut request = self
            .client
            .post(&self.topic_url)
            .timeout(self.timeout)
            .json(message);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(PublishError::Rejected(status.as_u16()));
        }
        Ok(())
    }
}
