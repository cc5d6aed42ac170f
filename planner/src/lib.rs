//! Task-lifecycle core for robot behavior arbitration.
//!
//! Cooperating tasks are started and stopped by conditions evaluated over a
//! shared blackboard, and exactly one task drives the control channels on any
//! tick. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (conditions, tasks, arbitration).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, mission files, mission log).
//!
//! [`mission`] is the tick scheduler and [`plan`] assembles missions from
//! JSON. Orchestration modules ([`run`], [`validate`]) coordinate both with
//! I/O to implement CLI commands.

pub mod behaviors;
pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod mission;
pub mod plan;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod validate;
