//! Typed failures raised by the task-lifecycle core.
//!
//! Every variant is a programming or configuration defect: none of them is
//! retried, and a mission halts on the first one it sees.

use thiserror::Error;

use crate::core::task::TaskId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("blackboard field '{0}' is not present")]
    MissingField(String),

    #[error("blackboard field '{field}' holds a {found}, expected a {expected}")]
    FieldType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("blackboard field '{field}' is written by '{owner}', not '{writer}'")]
    ForeignWriter {
        field: String,
        owner: String,
        writer: String,
    },

    #[error("control channel '{0}' is not wired")]
    UnknownChannel(String),

    #[error("{task} does not hold the control grant")]
    ControlNotGranted { task: TaskId },

    #[error("control is held by {holder}; revoke it before granting {task}")]
    ControlBusy { holder: TaskId, task: TaskId },

    #[error("{0} is not registered in this mission")]
    UnknownTask(TaskId),

    #[error("no task named '{0}'")]
    UnknownTaskName(String),

    #[error("flow conditions loop back through {0}")]
    FlowCycle(TaskId),

    #[error("task '{0}' was used before setup")]
    NotSetUp(String),

    #[error("task '{0}' ticked while inactive")]
    NotActive(String),

    #[error("task '{0}' is already set up")]
    AlreadySetUp(String),

    #[error("task '{task}' has unmet requirements: {}", .missing.join(", "))]
    UnmetRequirements { task: String, missing: Vec<String> },

    #[error("mission is invalid: {}", .0.join("; "))]
    InvalidMission(Vec<String>),
}
