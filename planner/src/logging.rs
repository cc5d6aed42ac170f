//! Diagnostic tracing for the planner, written to stderr.
//!
//! This is separate from the mission log (`io/mission_log`), which is the
//! product record of a run in `mission.log`. That file is controlled by
//! `planner.toml` and ignores `RUST_LOG`.
//!
//! # What is traced
//!
//! - Every task slot opens a `task` span at setup, with fields `kind` (the
//!   task's Rust type) and `name` (its mission name). Condition queries and
//!   task ticks run inside that span, so their events carry both fields.
//! - `info`: mission assembly, each activation and deactivation (with the
//!   `tick` it happened on), and the end of a run.
//! - `debug`: task setup and one event per tick naming the active task, or
//!   `no task eligible` for an idle tick.
//! - `trace`: individual start and stop verdicts.
//!
//! Filter per target, e.g. `RUST_LOG=planner::mission=debug`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default directive when `RUST_LOG` is unset or invalid.
const DEFAULT_FILTER: &str = "warn";

/// Install the stderr subscriber. Call once, before the first span is created.
///
/// ```bash
/// RUST_LOG=planner=debug planner run --ticks 20
/// ```
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
