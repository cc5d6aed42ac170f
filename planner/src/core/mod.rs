//! Deterministic task-lifecycle logic.
//!
//! Core modules are free of I/O side effects. They operate on in-memory
//! blackboards, control channels and task slots, and return deterministic
//! outputs suitable for tests.

pub mod arbiter;
pub mod blackboard;
pub mod condition;
pub mod control;
pub mod data_conditions;
pub mod default_task;
pub mod flow;
pub mod invariants;
pub mod requirement;
pub mod task;
pub mod tolerance;
