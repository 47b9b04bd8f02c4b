//! Round-trip latency monitor for pub/sub channels.

pub mod alert;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod probe;
pub mod transport;

pub use config::MonitorConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use probe::Correlator;
