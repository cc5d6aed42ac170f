//! Stable exit codes for planner CLI commands.

/// Command succeeded; `planner run` ended with a task in control.
pub const OK: i32 = 0;
/// Invalid config, mission file or mission assembly, or any other error.
pub const INVALID: i32 = 1;
/// `planner run` ended with no task in control.
pub const IDLE: i32 = 2;
/// `planner run` skipped because `run = false` in `planner.toml`.
pub const DISABLED: i32 = 3;
