//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize subsystems in dependency order from a validated config
//! - Start background tasks (dispatch loop, sweeper, signal listener)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds before background tasks start, so a bad address never
//!   leaves probes in flight
//! - Background tasks are joined after the listener stops

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::alert::Notifier;
use crate::config::{Mode, MonitorConfig};
use crate::health::HealthProber;
use crate::http::{AppState, HttpServer};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::metrics;
use crate::probe::{Correlator, DispatchLoop, Sweeper};
use crate::transport::{HttpPublisher, PublishError, Relay};

/// Errors that prevent the monitor from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("transport misconfigured: {0}")]
    Transport(#[from] PublishError),

    #[error("invalid {field} '{value}'")]
    Address { field: &'static str, value: String },

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Fully wired subsystems, before any task is spawned.
pub struct Components {
    pub state: AppState,
    pub correlator: Option<Arc<Correlator>>,
}

/// Build every subsystem the configured mode needs.
pub fn build_components(config: &MonitorConfig, shutdown: &Shutdown) -> Result<Components, StartupError> {
    // Fallback bound for relay callbacks; publisher, alert sinks and health
    // polls set their own per-request timeouts.
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.alerts.timeout_secs.max(config.transport.publish_timeout_secs)))
        .user_agent(concat!("pubsub-latency-monitor/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let notifier = Notifier::from_config(&config.alerts, client.clone());

    let correlator = match config.mode {
        Mode::Monitor => {
            let publisher = HttpPublisher::from_config(client.clone(), &config.transport)?;
            Some(Arc::new(Correlator::new(
                Arc::new(publisher),
                notifier.clone(),
                &config.probe,
            )))
        }
        Mode::Relay => None,
    };

    let relay = match config.mode {
        Mode::Relay => Some(Arc::new(Relay::new(
            client.clone(),
            &config.relay,
            &config.probe,
            notifier.clone(),
        ))),
        Mode::Monitor => None,
    };

    let prober = HealthProber::from_config(client, &config.health_probe, notifier).map(Arc::new);
    if prober.is_none() {
        tracing::info!("Health target is not set, lifecycle events will be ignored");
    }

    let state = AppState {
        mode: config.mode,
        correlator: correlator.clone(),
        relay,
        prober,
        shutdown: shutdown.clone(),
    };

    Ok(Components { state, correlator })
}

/// Run the monitor until `shutdown` is triggered.
pub async fn run(config: MonitorConfig, shutdown: Shutdown) -> Result<(), StartupError> {
    tracing::info!(
        mode = %config.mode,
        bind_address = %config.listener.bind_address,
        dispatch_interval_secs = config.probe.dispatch_interval_secs,
        latency_threshold_secs = config.probe.latency_threshold_secs,
        timeout_secs = config.probe.timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::Address {
                field: "metrics address",
                value: config.observability.metrics_address.clone(),
            })?;
        metrics::init_metrics(addr)?;
    }

    let components = build_components(&config, &shutdown)?;

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let mut tasks = Vec::new();
    if let Some(correlator) = &components.correlator {
        let sweeper = Sweeper::new(correlator.clone(), config.probe.sweep_interval());
        tasks.push(tokio::spawn(sweeper.run(shutdown.subscribe())));

        let dispatcher = DispatchLoop::new(correlator.clone(), config.probe.dispatch_interval());
        tasks.push(tokio::spawn(dispatcher.run(shutdown.subscribe())));
    }

    let server = HttpServer::new(components.state, &config.listener);
    let result = server.run(listener, shutdown.clone()).await;

    // Listener may have stopped on its own; make sure the loops follow.
    shutdown.trigger();
    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Background task ended abnormally");
        }
    }

    result.map_err(StartupError::Serve)
}
