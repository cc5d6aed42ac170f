//! Boolean predicates gating task start and stop.
//!
//! A condition is a pure query: it reads the blackboard or another task's
//! lifecycle through an [`EvalContext`] and never writes. A condition that
//! cannot produce a verdict returns an error instead of guessing.

use std::fmt;
use std::rc::Rc;

use crate::core::blackboard::Blackboard;
use crate::core::task::{TaskId, TaskSlot};
use crate::error::PlanError;

/// Task the scheduler considers "previous" for flow conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predecessor {
    /// No task has been activated yet.
    MissionStart,
    /// The most recently activated task.
    Task(TaskId),
}

/// Everything a condition may read during one evaluation.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    data: &'a Blackboard,
    tasks: &'a [TaskSlot],
    predecessor: Predecessor,
    depth: usize,
}

impl<'a> EvalContext<'a> {
    pub fn new(data: &'a Blackboard, tasks: &'a [TaskSlot], predecessor: Predecessor) -> Self {
        Self {
            data,
            tasks,
            predecessor,
            depth: 0,
        }
    }

    /// Context with no registered tasks, for data-only conditions.
    #[cfg(test)]
    pub fn detached(data: &'a Blackboard) -> Self {
        Self::new(data, &[], Predecessor::MissionStart)
    }

    pub fn data(&self) -> &'a Blackboard {
        self.data
    }

    pub fn predecessor(&self) -> Predecessor {
        self.predecessor
    }

    /// Evaluate `task`'s stop conditions from inside another condition.
    ///
    /// Nested evaluations deeper than the task count can only come from a
    /// cycle of flow conditions and are rejected.
    pub fn task_can_stop(&self, task: TaskId) -> Result<bool, PlanError> {
        let slot = self
            .tasks
            .get(task.0)
            .filter(|slot| slot.id() == task)
            .ok_or(PlanError::UnknownTask(task))?;
        if self.depth >= self.tasks.len() {
            return Err(PlanError::FlowCycle(task));
        }
        let nested = EvalContext {
            depth: self.depth + 1,
            ..*self
        };
        slot.can_stop(&nested)
    }
}

impl fmt::Debug for EvalContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvalContext")
            .field("tasks", &self.tasks.len())
            .field("predecessor", &self.predecessor)
            .field("depth", &self.depth)
            .finish()
    }
}

pub trait Condition: fmt::Debug {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError>;
}

pub type BoxedCondition = Box<dyn Condition>;

/// Shared conditions built once and handed out on every query.
impl<C: Condition + ?Sized> Condition for Rc<C> {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        (**self).test(ctx)
    }
}

/// Never holds. A task stopping on `Never` keeps control until preempted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Never;

impl Condition for Never {
    fn test(&self, _ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        Ok(false)
    }
}

/// Always holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Always;

impl Condition for Always {
    fn test(&self, _ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        Ok(true)
    }
}

/// Holds when every inner condition holds. Empty holds.
#[derive(Debug, Default)]
pub struct AllOf(pub Vec<BoxedCondition>);

impl Condition for AllOf {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        for condition in &self.0 {
            if !condition.test(ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Holds when any inner condition holds. Empty does not hold.
#[derive(Debug, Default)]
pub struct AnyOf(pub Vec<BoxedCondition>);

impl Condition for AnyOf {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        for condition in &self.0 {
            if condition.test(ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug)]
pub struct Not(pub BoxedCondition);

impl Condition for Not {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        Ok(!self.0.test(ctx)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::data_conditions::Above;

    fn empty_ctx(data: &Blackboard) -> EvalContext<'_> {
        EvalContext::detached(data)
    }

    #[test]
    fn never_is_false_on_every_call() {
        let data = Blackboard::new();
        let ctx = empty_ctx(&data);
        for _ in 0..3 {
            assert!(!Never.test(&ctx).expect("never"));
        }
    }

    #[test]
    fn always_is_true() {
        let data = Blackboard::new();
        assert!(Always.test(&empty_ctx(&data)).expect("always"));
    }

    #[test]
    fn combinators_follow_boolean_logic() {
        let data = Blackboard::new();
        let ctx = empty_ctx(&data);
        assert!(AllOf(Vec::new()).test(&ctx).expect("empty all"));
        assert!(!AnyOf(Vec::new()).test(&ctx).expect("empty any"));
        assert!(
            !AllOf(vec![Box::new(Always), Box::new(Never)])
                .test(&ctx)
                .expect("all")
        );
        assert!(
            AnyOf(vec![Box::new(Never), Box::new(Always)])
                .test(&ctx)
                .expect("any")
        );
        assert!(Not(Box::new(Never)).test(&ctx).expect("not"));
    }

    #[test]
    fn evaluation_errors_propagate_through_combinators() {
        let data = Blackboard::new();
        let ctx = empty_ctx(&data);
        let condition = Not(Box::new(AllOf(vec![
            Box::new(Always),
            Box::new(Above::new("obstacle_distance", 0.08)),
        ])));
        let err = condition.test(&ctx).expect_err("missing field");
        assert_eq!(
            err,
            PlanError::MissingField("obstacle_distance".to_string())
        );
    }

    #[test]
    fn unknown_task_is_an_error() {
        let data = Blackboard::new();
        let err = empty_ctx(&data)
            .task_can_stop(TaskId(4))
            .expect_err("unknown");
        assert_eq!(err, PlanError::UnknownTask(TaskId(4)));
    }
}
