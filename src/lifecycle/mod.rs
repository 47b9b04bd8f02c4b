//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → Build subsystems → Bind listener → Spawn loops → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Loops exit between ticks → Listener drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Outstanding probes are abandoned on shutdown, not flushed
//! - Health probes in progress are cancelled without alerting

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_components, run, Components, StartupError};
