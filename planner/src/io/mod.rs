//! I/O helpers for planner commands.

pub mod config;
pub mod init;
pub mod mission_log;
pub mod mission_store;
