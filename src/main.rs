//! Pub/sub round-trip latency monitor.
//!
//! # Architecture Overview
//!
//! ```text
//!   monitor role                                   relay role
//!  ┌───────────────────────────────┐              ┌──────────────────────────┐
//!  │ dispatch loop ──▶ correlator ─┼── publish ──▶│   channel delivery       │
//!  │                   │ pending │ │              │   POST /events           │
//!  │ sweeper ─────────▶│   set   │ │              │        │                 │
//!  │                   └────┬────┘ │              │        ▼                 │
//!  │ POST /callback ──────▶ │      │◀─ callback ──┼── relay (echo)           │
//!  │                        ▼      │              │                          │
//!  │                     alerts    │              │ lifecycle event          │
//!  │                               │              │   → health prober        │
//!  └───────────────────────────────┘              └──────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use pubsub_latency_monitor::config::{loader, Mode};
use pubsub_latency_monitor::lifecycle::{self, signals, Shutdown};
use pubsub_latency_monitor::observability::logging;

#[derive(Parser)]
#[command(name = "pubsub-latency-monitor")]
#[command(about = "Round-trip latency monitor for pub/sub channels", long_about = None)]
struct Cli {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "MONITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Role of this process (monitor or relay); overrides MODE.
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Listener bind address; overrides BIND_ADDRESS.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match loader::load_config(cli.config.as_deref()).and_then(|mut config| {
        if let Some(mode) = cli.mode {
            config.mode = mode;
        }
        if let Some(bind) = cli.bind {
            config.listener.bind_address = bind;
        }
        loader::finalize(config)
    }) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), mode = %config.mode, "pubsub-latency-monitor starting");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    match lifecycle::run(config, shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Monitor failed");
            ExitCode::FAILURE
        }
    }
}
