//! Task contract and the runtime slot that drives it.
//!
//! [`Task`] is what a behavior implements. [`TaskSlot`] is what the mission
//! holds: it owns the boxed task, performs the one-time setup, keeps the
//! lifecycle state, and scopes diagnostics to the task's concrete type.

use std::fmt;

use tracing::{Span, debug, info_span, trace};

use crate::core::arbiter::Rank;
use crate::core::blackboard::Blackboard;
use crate::core::condition::{BoxedCondition, EvalContext};
use crate::core::control::{ControlHandle, ControlWrapper};
use crate::core::requirement::Requirement;
use crate::error::PlanError;

/// Index of a task within its mission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task #{}", self.0)
    }
}

/// A behavior the mission can arbitrate.
///
/// None of the methods has a default body: a behavior without an explicit
/// start, stop, or tick policy does not compile.
pub trait Task {
    /// Blackboard fields and control channels this task depends on.
    fn requirements(&self) -> Requirement;

    /// Predicate gating activation. Built fresh on every query.
    fn start_conditions(&self) -> BoxedCondition;

    /// Predicate gating deactivation. Built fresh on every query.
    fn stop_conditions(&self) -> BoxedCondition;

    /// One control tick of behavior. Must not block.
    fn tick(&mut self, data: &Blackboard, control: &mut ControlHandle<'_>) -> Result<(), PlanError>;
}

/// Lifecycle of a task as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Inactive,
    Active,
}

pub struct TaskSlot {
    id: TaskId,
    name: String,
    kind: &'static str,
    rank: Rank,
    task: Box<dyn Task>,
    span: Option<Span>,
    lifecycle: Lifecycle,
    ticks: u64,
}

impl TaskSlot {
    pub fn new<T: Task + 'static>(
        id: TaskId,
        name: impl Into<String>,
        rank: Rank,
        task: T,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind: type_label::<T>(),
            rank,
            task: Box::new(task),
            span: None,
            lifecycle: Lifecycle::Inactive,
            ticks: 0,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concrete type name of the wrapped task, without module path.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Number of ticks this task has run.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_set_up(&self) -> bool {
        self.span.is_some()
    }

    pub fn requirements(&self) -> Requirement {
        self.task.requirements()
    }

    /// Bind the task to the mission's blackboard and control channels.
    ///
    /// Verifies the requirements against both and attaches the diagnostic
    /// span. Must run exactly once, before any query or tick.
    pub fn setup(&mut self, data: &Blackboard, control: &ControlWrapper) -> Result<(), PlanError> {
        if self.is_set_up() {
            return Err(PlanError::AlreadySetUp(self.name.clone()));
        }
        self.task.requirements().check(&self.name, data, control)?;
        let span = info_span!("task", kind = self.kind, name = %self.name);
        span.in_scope(|| debug!(rank = ?self.rank, "task set up"));
        self.span = Some(span);
        Ok(())
    }

    /// Evaluate the start conditions against the current blackboard.
    pub fn can_start(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        let _entered = self.span()?.enter();
        let verdict = self.task.start_conditions().test(ctx)?;
        trace!(verdict, "start conditions evaluated");
        Ok(verdict)
    }

    /// Evaluate the stop conditions against the current blackboard.
    pub fn can_stop(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        let _entered = self.span()?.enter();
        let verdict = self.task.stop_conditions().test(ctx)?;
        trace!(verdict, "stop conditions evaluated");
        Ok(verdict)
    }

    /// Run one tick. Only an active task may tick.
    pub fn tick(
        &mut self,
        data: &Blackboard,
        control: &mut ControlHandle<'_>,
    ) -> Result<(), PlanError> {
        let span = self
            .span
            .as_ref()
            .ok_or_else(|| PlanError::NotSetUp(self.name.clone()))?;
        if self.lifecycle != Lifecycle::Active {
            return Err(PlanError::NotActive(self.name.clone()));
        }
        let _entered = span.enter();
        self.task.tick(data, control)?;
        self.ticks += 1;
        Ok(())
    }

    pub fn activate(&mut self) {
        self.lifecycle = Lifecycle::Active;
    }

    pub fn deactivate(&mut self) {
        self.lifecycle = Lifecycle::Inactive;
    }

    fn span(&self) -> Result<&Span, PlanError> {
        self.span
            .as_ref()
            .ok_or_else(|| PlanError::NotSetUp(self.name.clone()))
    }
}

impl fmt::Debug for TaskSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskSlot")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("rank", &self.rank)
            .field("lifecycle", &self.lifecycle)
            .field("ticks", &self.ticks)
            .finish_non_exhaustive()
    }
}

/// `planner::core::default_task::DefaultTask<..::Halt>` -> `DefaultTask`.
fn type_label<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
