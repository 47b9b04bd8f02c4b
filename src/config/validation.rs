//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, threshold >= 0)
//! - Check that URLs and socket addresses parse
//! - Enforce role requirements (monitor mode needs a topic)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{Mode, MonitorConfig};

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must be a non-negative number, got {value}")]
    InvalidThreshold { field: &'static str, value: f64 },

    #[error("{field} is not a valid URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} is required in {mode} mode")]
    Missing { field: &'static str, mode: Mode },
}

/// Validate a fully assembled configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_positive(&mut errors, "listener.max_body_bytes", config.listener.max_body_bytes as u64);
    check_positive(&mut errors, "listener.request_timeout_secs", config.listener.request_timeout_secs);

    check_positive(&mut errors, "transport.publish_timeout_secs", config.transport.publish_timeout_secs);
    check_optional_url(&mut errors, "transport.topic_url", config.transport.topic_url.as_deref());
    if config.mode == Mode::Monitor && config.transport.topic_url.is_none() {
        errors.push(ValidationError::Missing {
            field: "transport.topic_url",
            mode: config.mode,
        });
    }

    check_positive(&mut errors, "probe.dispatch_interval_secs", config.probe.dispatch_interval_secs);
    check_positive(&mut errors, "probe.timeout_secs", config.probe.timeout_secs);
    check_positive(&mut errors, "probe.sweep_interval_secs", config.probe.sweep_interval_secs);
    let threshold = config.probe.latency_threshold_secs;
    if !threshold.is_finite() || threshold < 0.0 {
        errors.push(ValidationError::InvalidThreshold {
            field: "probe.latency_threshold_secs",
            value: threshold,
        });
    }

    check_optional_url(&mut errors, "relay.callback_url", config.relay.callback_url.as_deref());

    check_optional_url(&mut errors, "health_probe.target", config.health_probe.target.as_deref());
    check_positive(&mut errors, "health_probe.poll_interval_secs", config.health_probe.poll_interval_secs);
    check_positive(&mut errors, "health_probe.wait_minutes", config.health_probe.wait_minutes);
    check_positive(&mut errors, "health_probe.request_timeout_secs", config.health_probe.request_timeout_secs);

    check_optional_url(&mut errors, "alerts.slack_webhook_url", config.alerts.slack_webhook_url.as_deref());
    check_optional_url(&mut errors, "alerts.pagerduty_url", Some(&config.alerts.pagerduty_url));
    check_positive(&mut errors, "alerts.timeout_secs", config.alerts.timeout_secs);

    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_positive(errors: &mut Vec<ValidationError>, field: &'static str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::NotPositive { field });
    }
}

fn check_optional_url(errors: &mut Vec<ValidationError>, field: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        if Url::parse(value).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field,
                value: value.to_string(),
            });
        }
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
