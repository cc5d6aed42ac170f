//! Behaviors configurable from a mission plan.

use std::rc::Rc;

use crate::core::blackboard::Blackboard;
use crate::core::condition::{BoxedCondition, Condition};
use crate::core::control::ControlHandle;
use crate::core::default_task::{Behavior, Halt};
use crate::core::requirement::Requirement;
use crate::core::task::Task;
use crate::error::PlanError;
use crate::plan::{BehaviorPlan, TaskIndex, TaskPlan};

pub const VELOCITY: &str = "velocity";
pub const TURNRATE: &str = "turnrate";

/// Commands a constant forward velocity and turn rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drive {
    pub velocity: f64,
    pub turnrate: f64,
}

impl Behavior for Drive {
    fn requirements(&self) -> Requirement {
        Requirement::new().channel(VELOCITY).channel(TURNRATE)
    }

    fn tick(
        &mut self,
        _data: &Blackboard,
        control: &mut ControlHandle<'_>,
    ) -> Result<(), PlanError> {
        control.set(VELOCITY, self.velocity)?;
        control.set(TURNRATE, self.turnrate)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfiguredBehavior {
    Halt(Halt),
    Drive(Drive),
}

impl From<&BehaviorPlan> for ConfiguredBehavior {
    fn from(plan: &BehaviorPlan) -> Self {
        match plan {
            BehaviorPlan::Halt => ConfiguredBehavior::Halt(Halt::new([VELOCITY, TURNRATE])),
            BehaviorPlan::Drive { velocity, turnrate } => ConfiguredBehavior::Drive(Drive {
                velocity: *velocity,
                turnrate: *turnrate,
            }),
        }
    }
}

impl Behavior for ConfiguredBehavior {
    fn requirements(&self) -> Requirement {
        match self {
            ConfiguredBehavior::Halt(halt) => halt.requirements(),
            ConfiguredBehavior::Drive(drive) => drive.requirements(),
        }
    }

    fn tick(
        &mut self,
        data: &Blackboard,
        control: &mut ControlHandle<'_>,
    ) -> Result<(), PlanError> {
        match self {
            ConfiguredBehavior::Halt(halt) => halt.tick(data, control),
            ConfiguredBehavior::Drive(drive) => drive.tick(data, control),
        }
    }
}

/// A prioritized task assembled from a [`TaskPlan`].
///
/// Conditions are built once and shared with every query; they hold no state,
/// so each query still sees the current blackboard.
#[derive(Debug)]
pub struct ConfiguredTask {
    behavior: ConfiguredBehavior,
    start: Rc<dyn Condition>,
    stop: Rc<dyn Condition>,
    requirement: Requirement,
}

impl ConfiguredTask {
    pub fn from_plan(plan: &TaskPlan, index: &TaskIndex) -> Result<Self, PlanError> {
        let behavior = ConfiguredBehavior::from(&plan.behavior);
        let requirement = plan
            .start
            .fields()
            .into_iter()
            .chain(plan.stop.fields())
            .chain(plan.requires.iter().map(String::as_str))
            .fold(behavior.requirements(), |req, field| req.field(field));
        Ok(Self {
            start: plan.start.build(index)?,
            stop: plan.stop.build(index)?,
            behavior,
            requirement,
        })
    }
}

impl Task for ConfiguredTask {
    fn requirements(&self) -> Requirement {
        self.requirement.clone()
    }

    fn start_conditions(&self) -> BoxedCondition {
        Box::new(Rc::clone(&self.start))
    }

    fn stop_conditions(&self) -> BoxedCondition {
        Box::new(Rc::clone(&self.stop))
    }

    fn tick(
        &mut self,
        data: &Blackboard,
        control: &mut ControlHandle<'_>,
    ) -> Result<(), PlanError> {
        self.behavior.tick(data, control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::control::ControlWrapper;
    use crate::core::task::TaskId;
    use crate::plan::ConditionPlan;

    fn approach() -> TaskPlan {
        TaskPlan {
            name: "approach".to_string(),
            priority: 2,
            behavior: BehaviorPlan::Drive {
                velocity: 0.25,
                turnrate: -0.1,
            },
            start: ConditionPlan::Below {
                field: "range".to_string(),
                value: 2.0,
            },
            stop: ConditionPlan::CloseTo {
                field: "range".to_string(),
                target: Some(0.3),
                target_field: None,
                eps: None,
            },
            requires: vec!["dock_id".to_string()],
        }
    }

    #[test]
    fn requirements_cover_conditions_behavior_and_extras() {
        let task = ConfiguredTask::from_plan(&approach(), &TaskIndex::new()).expect("task");
        let req = task.requirements();
        let fields: Vec<_> = req.fields().collect();
        let channels: Vec<_> = req.channels().collect();
        assert_eq!(fields, vec!["dock_id", "range"]);
        assert_eq!(channels, vec!["turnrate", "velocity"]);
    }

    #[test]
    fn drive_commands_both_channels() {
        let data = Blackboard::new();
        let mut control = ControlWrapper::with_channels([VELOCITY, TURNRATE]);
        control.grant(TaskId(0)).expect("grant");
        let mut behavior = ConfiguredBehavior::from(&approach().behavior);
        {
            let mut handle = control.handle(TaskId(0)).expect("handle");
            behavior.tick(&data, &mut handle).expect("tick");
        }
        assert_eq!(control.value(VELOCITY), Some(0.25));
        assert_eq!(control.value(TURNRATE), Some(-0.1));
    }

    #[test]
    fn halt_plan_zeroes_drive_channels() {
        let behavior = ConfiguredBehavior::from(&BehaviorPlan::Halt);
        assert_eq!(
            behavior,
            ConfiguredBehavior::Halt(Halt::new([VELOCITY, TURNRATE]))
        );
    }

    #[test]
    fn unknown_follow_target_fails_construction() {
        let mut plan = approach();
        plan.start = ConditionPlan::FollowPrevious {
            task: Some("undock".to_string()),
        };
        let err = ConfiguredTask::from_plan(&plan, &TaskIndex::new()).expect_err("unknown");
        assert_eq!(err, PlanError::UnknownTaskName("undock".to_string()));
    }
}
