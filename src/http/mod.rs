//! HTTP inbound transport.
//!
//! # Data Flow
//! ```text
//! POST /callback, POST /events
//!     → request id, tracing, body limit, timeout (tower-http)
//!     → server.rs: InboundMessage::decode
//!     → Correlator | Relay | HealthProber
//!
//! GET /healthz, GET /status
//! ```

pub mod server;

pub use server::{build_router, AppState, HttpServer};
