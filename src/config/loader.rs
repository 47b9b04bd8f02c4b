//! Configuration loading from disk and the environment.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::config::schema::MonitorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { key: &'static str, value: String, reason: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { key, value, reason } => {
                write!(f, "Invalid value '{}' for {}: {}", value, key, reason)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML file into a configuration without validating it.
pub fn read_config_file(path: &Path) -> Result<MonitorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Build the configuration from an optional file plus process environment.
///
/// The result is not validated yet; callers apply CLI overrides first and
/// then call [`finalize`].
pub fn load_config(path: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config_file(path)?,
        None => MonitorConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Run semantic validation and hand back the accepted configuration.
pub fn finalize(config: MonitorConfig) -> Result<MonitorConfig, ConfigError> {
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment-style settings onto `config`.
///
/// Empty values are treated as unset. Values that fail to parse are errors,
/// not silent fallbacks to the default.
pub fn apply_env_overrides<F>(config: &mut MonitorConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("MODE") {
        config.mode = parse_env("MODE", &v)?;
    }
    if let Some(v) = get("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }

    if let Some(v) = get("PROBE_TOPIC_URL") {
        config.transport.topic_url = Some(v);
    }
    if let Some(v) = get("PROBE_TOPIC_TOKEN") {
        config.transport.auth_token = Some(v);
    }

    if let Some(v) = get("PUBLISH_INTERVAL_SECONDS") {
        config.probe.dispatch_interval_secs = parse_env("PUBLISH_INTERVAL_SECONDS", &v)?;
    }
    if let Some(v) = get("LATENCY_THRESHOLD_SECONDS") {
        config.probe.latency_threshold_secs = parse_env("LATENCY_THRESHOLD_SECONDS", &v)?;
    }
    if let Some(v) = get("HEALTHCHECK_TIMEOUT") {
        config.probe.timeout_secs = parse_env("HEALTHCHECK_TIMEOUT", &v)?;
    }
    if let Some(v) = get("SWEEP_INTERVAL_SECONDS") {
        config.probe.sweep_interval_secs = parse_env("SWEEP_INTERVAL_SECONDS", &v)?;
    }

    if let Some(v) = get("CALLBACK_URL") {
        config.relay.callback_url = Some(v);
    }

    if let Some(v) = get("ADDR") {
        config.health_probe.target = Some(v);
    }
    if let Some(v) = get("HEALTH_POLL_INTERVAL_SECONDS") {
        config.health_probe.poll_interval_secs = parse_env("HEALTH_POLL_INTERVAL_SECONDS", &v)?;
    }
    if let Some(v) = get("WAIT_MINUTES") {
        config.health_probe.wait_minutes = parse_env("WAIT_MINUTES", &v)?;
    }

    if let Some(v) = get("SLACK_WEBHOOK_URL") {
        config.alerts.slack_webhook_url = Some(v);
    }
    if let Some(v) = get("PAGERDUTY_ROUTING_KEY") {
        config.alerts.pagerduty_routing_key = Some(v);
    }
    if let Some(v) = get("ALERT_SOURCE") {
        config.alerts.source = v;
    }
    if let Some(v) = get("ALERT_SUBJECT_PREFIX") {
        config.alerts.subject_prefix = Some(v);
    }

    if let Some(v) = get("LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = get("LOG_FORMAT") {
        config.observability.log_format = parse_env("LOG_FORMAT", &v)?;
    }
    if let Some(v) = get("METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_env("METRICS_ENABLED", &v)?;
    }
    if let Some(v) = get("METRICS_ADDRESS") {
        config.observability.metrics_address = v;
    }

    Ok(())
}

fn parse_env<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::Env {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
