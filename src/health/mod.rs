//! Health probing subsystem (secondary mode).
//!
//! # Data Flow
//! ```text
//! Lifecycle event (inbound payload without a timestamp)
//!     → prober.rs: poll target every interval
//!     → state.rs: Polling → HealthyExit | TimeoutExit | Cancelled
//!     → TimeoutExit raises one alert
//! ```
//!
//! # Design Decisions
//! - Independent of the pending set
//! - Bounded by its own deadline; also observes process shutdown
//! - At most one run in flight; concurrent events are coalesced

pub mod prober;
pub mod state;

pub use prober::HealthProber;
pub use state::{ProbeOutcome, ProbeRun, ProberState};
