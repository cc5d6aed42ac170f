//! Conditions over another task's lifecycle, used to chain tasks.

use crate::core::condition::{Condition, EvalContext, Predecessor};
use crate::core::task::TaskId;
use crate::error::PlanError;

/// Holds when the previous task's own stop conditions hold.
///
/// With no explicit target the scheduler's predecessor is followed. At
/// mission start there is no predecessor to wait for, so it holds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowPreviousTask {
    target: Option<TaskId>,
}

impl FollowPreviousTask {
    /// Follow whichever task the scheduler activated most recently.
    pub fn new() -> Self {
        Self { target: None }
    }

    /// Follow a fixed task regardless of scheduling history.
    pub fn after(task: TaskId) -> Self {
        Self { target: Some(task) }
    }
}

impl Condition for FollowPreviousTask {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        let previous = match (self.target, ctx.predecessor()) {
            (Some(task), _) => task,
            (None, Predecessor::Task(task)) => task,
            (None, Predecessor::MissionStart) => return Ok(true),
        };
        ctx.task_can_stop(previous)
    }
}

/// Holds only until the first task has been activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MissionStart;

impl Condition for MissionStart {
    fn test(&self, ctx: &EvalContext<'_>) -> Result<bool, PlanError> {
        Ok(ctx.predecessor() == Predecessor::MissionStart)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arbiter::Rank;
    use crate::core::blackboard::Blackboard;
    use crate::core::condition::Never;
    use crate::core::default_task::{DefaultTask, Halt};
    use crate::core::requirement::Requirement;
    use crate::core::task::{Task, TaskSlot};
    use crate::test_support::{FlagTask, drive_control, flag_board};

    /// Task chained to a fixed predecessor.
    struct Chained(TaskId);

    impl Task for Chained {
        fn requirements(&self) -> Requirement {
            Requirement::new()
        }
        fn start_conditions(&self) -> Box<dyn Condition> {
            Box::new(FollowPreviousTask::after(self.0))
        }
        fn stop_conditions(&self) -> Box<dyn Condition> {
            Box::new(FollowPreviousTask::after(self.0))
        }
        fn tick(
            &mut self,
            _data: &Blackboard,
            _control: &mut crate::core::control::ControlHandle<'_>,
        ) -> Result<(), PlanError> {
            Ok(())
        }
    }

    fn set_up(mut slots: Vec<TaskSlot>, data: &Blackboard) -> Vec<TaskSlot> {
        let control = drive_control();
        for slot in &mut slots {
            slot.setup(data, &control).expect("setup");
        }
        slots
    }

    #[test]
    fn follows_explicit_task_without_caching() {
        let mut data = flag_board(&[("ready", true), ("done", false)]);
        let slots = set_up(
            vec![
                TaskSlot::new(
                    TaskId(0),
                    "a",
                    Rank::Priority(1),
                    FlagTask::new("ready", "done", 0.3),
                ),
                TaskSlot::new(TaskId(1), "b", Rank::Priority(0), Chained(TaskId(0))),
            ],
            &data,
        );

        let ctx = EvalContext::new(&data, &slots, Predecessor::MissionStart);
        assert_eq!(
            slots[1].can_start(&ctx).expect("b start"),
            slots[0].can_stop(&ctx).expect("a stop")
        );
        assert!(!slots[1].can_start(&ctx).expect("b start"));

        data.update("perception", "done", true).expect("update");
        let ctx = EvalContext::new(&data, &slots, Predecessor::MissionStart);
        assert!(slots[0].can_stop(&ctx).expect("a stop"));
        assert!(slots[1].can_start(&ctx).expect("b start"));
    }

    #[test]
    fn default_follows_scheduler_predecessor() {
        let mut data = flag_board(&[("ready", true), ("done", false)]);
        let slots = set_up(
            vec![
                TaskSlot::new(
                    TaskId(0),
                    "a",
                    Rank::Priority(1),
                    FlagTask::new("ready", "done", 0.3),
                ),
                TaskSlot::new(
                    TaskId(1),
                    "fallback",
                    Rank::Fallback,
                    DefaultTask::new(Halt::new(["velocity"])),
                ),
            ],
            &data,
        );

        let ctx = EvalContext::new(&data, &slots, Predecessor::Task(TaskId(0)));
        assert!(!slots[1].can_start(&ctx).expect("blocked by a"));

        data.update("perception", "done", true).expect("update");
        let ctx = EvalContext::new(&data, &slots, Predecessor::Task(TaskId(0)));
        assert!(slots[1].can_start(&ctx).expect("a yielded"));
    }

    #[test]
    fn no_predecessor_resolves_true() {
        let data = Blackboard::new();
        let ctx = EvalContext::detached(&data);
        assert!(FollowPreviousTask::new().test(&ctx).expect("mission start"));
        assert!(MissionStart.test(&ctx).expect("mission start"));
    }

    #[test]
    fn mission_start_ends_after_first_activation() {
        let data = Blackboard::new();
        let slots: Vec<TaskSlot> = Vec::new();
        let ctx = EvalContext::new(&data, &slots, Predecessor::Task(TaskId(0)));
        assert!(!MissionStart.test(&ctx).expect("started"));
    }

    #[test]
    fn self_following_default_never_yields() {
        let data = Blackboard::new();
        let slots = set_up(
            vec![TaskSlot::new(
                TaskId(0),
                "fallback",
                Rank::Fallback,
                DefaultTask::new(Halt::new(["velocity"])),
            )],
            &data,
        );
        let ctx = EvalContext::new(&data, &slots, Predecessor::Task(TaskId(0)));
        assert!(!slots[0].can_start(&ctx).expect("follows own Never"));
        assert!(!Never.test(&ctx).expect("never"));
    }

    #[test]
    fn cyclic_chain_is_an_error() {
        let data = Blackboard::new();
        let slots = set_up(
            vec![
                TaskSlot::new(TaskId(0), "a", Rank::Priority(1), Chained(TaskId(1))),
                TaskSlot::new(TaskId(1), "b", Rank::Priority(1), Chained(TaskId(0))),
            ],
            &data,
        );
        let ctx = EvalContext::new(&data, &slots, Predecessor::MissionStart);
        let err = slots[0].can_start(&ctx).expect_err("cycle");
        assert!(matches!(err, PlanError::FlowCycle(_)));
    }

    #[test]
    fn unknown_target_is_an_error() {
        let data = Blackboard::new();
        let ctx = EvalContext::detached(&data);
        let err = FollowPreviousTask::after(TaskId(7))
            .test(&ctx)
            .expect_err("unknown");
        assert_eq!(err, PlanError::UnknownTask(TaskId(7)));
    }
}
