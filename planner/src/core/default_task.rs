//! The fallback task that keeps arbitration total.
//!
//! `DefaultTask` becomes eligible as soon as the previously active task may
//! stop, and never stops on its own. Only the scheduler's preemption of the
//! fallback by a prioritized task takes control away from it.

use std::fmt;

use crate::core::blackboard::Blackboard;
use crate::core::condition::{BoxedCondition, Never};
use crate::core::control::ControlHandle;
use crate::core::flow::FollowPreviousTask;
use crate::core::requirement::Requirement;
use crate::core::task::Task;
use crate::error::PlanError;

/// What the fallback does while it holds control.
pub trait Behavior: fmt::Debug {
    fn requirements(&self) -> Requirement;

    fn tick(&mut self, data: &Blackboard, control: &mut ControlHandle<'_>) -> Result<(), PlanError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefaultTask<B> {
    behavior: B,
}

impl<B: Behavior> DefaultTask<B> {
    pub fn new(behavior: B) -> Self {
        Self { behavior }
    }
}

impl<B: Behavior> Task for DefaultTask<B> {
    fn requirements(&self) -> Requirement {
        self.behavior.requirements()
    }

    fn start_conditions(&self) -> BoxedCondition {
        Box::new(FollowPreviousTask::new())
    }

    fn stop_conditions(&self) -> BoxedCondition {
        Box::new(Never)
    }

    fn tick(
        &mut self,
        data: &Blackboard,
        control: &mut ControlHandle<'_>,
    ) -> Result<(), PlanError> {
        self.behavior.tick(data, control)
    }
}

/// Holds the listed channels at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Halt {
    channels: Vec<String>,
}

impl Halt {
    pub fn new<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: channels.into_iter().map(Into::into).collect(),
        }
    }
}

impl Behavior for Halt {
    fn requirements(&self) -> Requirement {
        let mut req = Requirement::new();
        for channel in &self.channels {
            req = req.channel(channel.as_str());
        }
        req
    }

    fn tick(
        &mut self,
        _data: &Blackboard,
        control: &mut ControlHandle<'_>,
    ) -> Result<(), PlanError> {
        for channel in &self.channels {
            control.set(channel, 0.0)?;
        }
        Ok(())
    }
}
