//! Channel transport adapters.
//!
//! # Data Flow
//! ```text
//! Outbound:
//!     Correlator → publisher.rs (POST probe JSON to topic endpoint)
//!
//! Inbound (HTTP listener body):
//!     → inbound.rs (envelope unwrap, classify once)
//!         ProbeCallback  → Correlator
//!         Probe          → relay.rs (echo callback to monitor)
//!         LifecycleEvent → Health Prober
//! ```

pub mod inbound;
pub mod publisher;
pub mod relay;

pub use inbound::{DecodeError, InboundMessage};
pub use publisher::{HttpPublisher, PublishError, Publisher};
pub use relay::Relay;
