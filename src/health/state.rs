//! Health prober state machine.
//!
//! # States
//! - Polling: target not yet confirmed healthy, window still open
//! - HealthyExit: target answered 2xx (terminal, no alert)
//! - TimeoutExit: window exhausted without a 2xx (terminal, one alert)
//! - Cancelled: process shutdown while polling (terminal, no alert)
//!
//! # State Transitions
//! ```text
//! Polling → HealthyExit: poll returned 2xx
//! Polling → TimeoutExit: elapsed >= total wait
//! Polling → Cancelled:   shutdown observed between polls
//! ```

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProberState {
    Polling,
    HealthyExit,
    TimeoutExit,
    Cancelled,
}

impl ProberState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProberState::Polling)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProberState::Polling => "polling",
            ProberState::HealthyExit => "healthy",
            ProberState::TimeoutExit => "timeout",
            ProberState::Cancelled => "cancelled",
        }
    }
}

/// Summary of one bounded polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeRun {
    pub state: ProberState,
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Whether a lifecycle event started a new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Completed(ProbeRun),
    /// Another run was already in progress; this event was coalesced.
    AlreadyRunning,
}

/// "5 minutes" for whole minutes, "2.5 seconds" otherwise.
pub fn describe_window(window: Duration) -> String {
    let secs = window.as_secs();
    if secs >= 60 && secs % 60 == 0 && window.subsec_nanos() == 0 {
        let minutes = secs / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{} minutes", minutes)
        }
    } else {
        format!("{:.1} seconds", window.as_secs_f64())
    }
}
