//! Structured logging configuration.
//!
//! Library crates log through the `log` facade; the subscriber installed here
//! picks those records up alongside the simulator's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
const DEFAULT_FILTER: &str = "info,story_poker=info";

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// logging::init();
/// tracing::info!("Simulation starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true);

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();

    tracing::debug!("Structured logging initialized");
}

/// Log the outcome of one revealed round
pub fn log_round(round: usize, voters: usize, average: f64, rounded: &str, consensus: bool) {
    tracing::info!(
        round = round,
        voters = voters,
        average = average,
        rounded = rounded,
        consensus = consensus,
        "Round revealed"
    );
}
