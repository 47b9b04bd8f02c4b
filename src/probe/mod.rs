//! Probe correlation and expiry engine.
//!
//! # Data Flow
//! ```text
//! dispatcher.rs (every dispatch interval)
//!     → correlator.rs: assign seq, publish, insert into pending set
//!
//! inbound callback (HTTP)
//!     → correlator.rs: remove matching probe, judge latency, alert if late
//!
//! sweeper.rs (every sweep interval)
//!     → correlator.rs: evict probes older than the timeout, alert per probe
//! ```
//!
//! # Design Decisions
//! - Callback and sweep race for each probe; atomic removal under one lock
//!   decides the single winner
//! - Correlation key is a sequence number; the timestamp only feeds latency
//! - Pending set is in-memory; nothing survives a restart

pub mod correlator;
pub mod dispatcher;
pub mod sweeper;
pub mod types;

pub use correlator::{Correlator, DispatchError, Resolution};
pub use dispatcher::DispatchLoop;
pub use sweeper::Sweeper;
pub use types::{CallbackPayload, Probe, ProbeId, ProbeMessage};
