//! HTTP server setup and inbound handlers.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, body limit, timeout)
//! - Decode inbound bodies once and dispatch by variant
//! - Expose liveness and status endpoints

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ListenerConfig, Mode};
use crate::health::HealthProber;
use crate::lifecycle::Shutdown;
use crate::probe::Correlator;
use crate::transport::{DecodeError, InboundMessage, Relay};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub mode: Mode,
    /// Present when this process dispatches probes.
    pub correlator: Option<Arc<Correlator>>,
    /// Present when this process echoes probes.
    pub relay: Option<Arc<Relay>>,
    /// Present when a health target is configured.
    pub prober: Option<Arc<HealthProber>>,
    pub shutdown: Shutdown,
}

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub mode: Mode,
    pub pending_probes: Option<usize>,
    pub health_probe_running: bool,
}

/// HTTP listener for callbacks and channel deliveries.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(state: AppState, config: &ListenerConfig) -> Self {
        Self {
            router: build_router(state, config),
        }
    }

    /// Run the server until `shutdown` is triggered.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.signalled())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState, config: &ListenerConfig) -> Router {
    Router::new()
        .route("/callback", post(inbound_handler))
        .route("/events", post(inbound_handler))
        .route("/healthz", get(|| async { "ok" }))
        .route("/status", get(status_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(RequestBodyLimitLayer::new(config.max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

async fn status_handler(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        mode: state.mode,
        pending_probes: state.correlator.as_ref().map(|c| c.pending_count()),
        health_probe_running: state.prober.as_ref().is_some_and(|p| p.is_running()),
    })
}

/// Single entry point for every inbound payload.
async fn inbound_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let message = match InboundMessage::decode(&body) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(error = %e, "Rejected inbound payload");
            let message = match e {
                DecodeError::Json(_) => "Invalid JSON format",
                DecodeError::Callback(_) => "Invalid callback payload",
            };
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response();
        }
    };

    tracing::debug!(kind = message.kind(), "Inbound message decoded");

    match message {
        InboundMessage::ProbeCallback(callback) => match &state.correlator {
            Some(correlator) => {
                let resolution = correlator.resolve_callback(&callback).await;
                (
                    StatusCode::OK,
                    Json(json!({ "status": "callback processed", "outcome": resolution.outcome() })),
                )
                    .into_response()
            }
            None => {
                tracing::info!(timestamp = callback.timestamp, "Callback received but this process dispatches no probes");
                (StatusCode::OK, Json(json!({ "status": "ignored" }))).into_response()
            }
        },
        InboundMessage::Probe(probe) => match &state.relay {
            Some(relay) => {
                relay.echo(&probe).await;
                (StatusCode::OK, Json(json!({ "status": "probe echoed" }))).into_response()
            }
            None => {
                tracing::info!(timestamp = probe.timestamp, "Probe received but relay is not enabled");
                (StatusCode::OK, Json(json!({ "status": "ignored" }))).into_response()
            }
        },
        InboundMessage::LifecycleEvent(_) => match &state.prober {
            Some(prober) => {
                tracing::info!("Lifecycle event received, checking target health");
                let prober = prober.clone();
                let shutdown = state.shutdown.subscribe();
                tokio::spawn(async move {
                    prober.run(shutdown).await;
                });
                (
                    StatusCode::ACCEPTED,
                    Json(json!({ "status": "health probe scheduled" })),
                )
                    .into_response()
            }
            None => {
                tracing::info!("Lifecycle event received but no health target is set");
                (StatusCode::ACCEPTED, Json(json!({ "status": "ignored" }))).into_response()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn relay_less_state() -> AppState {
        AppState {
            mode: Mode::Relay,
            correlator: None,
            relay: None,
            prober: None,
            shutdown: Shutdown::new(),
        }
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_invalid_json_returns_bad_request() {
        let router = build_router(relay_less_state(), &ListenerConfig::default());
        let request = Request::post("/events").body(Body::from("not json")).unwrap();

        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid JSON format");
    }

    #[tokio::test]
    async fn test_malformed_callback_returns_bad_request() {
        let router = build_router(relay_less_state(), &ListenerConfig::default());
        let request = Request::post("/callback")
            .body(Body::from(r#"{"timestamp": 1700000000000, "received": "oops"}"#))
            .unwrap();

        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid callback payload");
    }

    #[tokio::test]
    async fn test_probe_without_relay_is_ignored() {
        let router = build_router(relay_less_state(), &ListenerConfig::default());
        let request = Request::post("/events")
            .body(Body::from(r#"{"timestamp": 1700000000000}"#))
            .unwrap();

        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ignored");
    }

    #[tokio::test]
    async fn test_status_reports_mode() {
        let router = build_router(relay_less_state(), &ListenerConfig::default());
        let request = Request::get("/status").body(Body::empty()).unwrap();

        let (status, body) = call(router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mode"], "relay");
        assert!(body["pending_probes"].is_null());
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let config = ListenerConfig {
            max_body_bytes: 16,
            ..ListenerConfig::default()
        };
        let router = build_router(relay_less_state(), &config);
        let request = Request::post("/events")
            .body(Body::from(vec![b'x'; 64]))
            .unwrap();

        let response = router.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
