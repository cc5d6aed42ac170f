//! Reference tick scheduler.
//!
//! A `Mission` owns the blackboard, the control channels and every task slot.
//! Each [`Mission::tick`] runs the same sequence:
//!
//! 1. If the active task can stop, deactivate it and revoke its control grant.
//! 2. If the fallback is active and a prioritized task can start, preempt it.
//! 3. If nothing is active, activate the [`select`]ed eligible task.
//! 4. Tick the active task with a control handle, or report an idle tick.
//!
//! Blackboard writes happen only between ticks, so every query inside a tick
//! sees the same snapshot.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::core::arbiter::{Candidate, Rank, preempts, select};
use crate::core::blackboard::{Blackboard, Value};
use crate::core::condition::{EvalContext, Predecessor};
use crate::core::control::ControlWrapper;
use crate::core::default_task::{Behavior, DefaultTask};
use crate::core::invariants::TASK_NAME;
use crate::core::task::{Task, TaskId, TaskSlot};
use crate::error::PlanError;

/// A lifecycle change observed during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Activated { task: String },
    Deactivated { task: String },
    Preempted { task: String, by: String },
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Zero-based tick number.
    pub tick: u64,
    /// Task that ran this tick; `None` for an idle tick.
    pub active: Option<String>,
    pub events: Vec<LifecycleEvent>,
}

/// Collects tasks before validation and setup.
pub struct MissionBuilder {
    blackboard: Blackboard,
    control: ControlWrapper,
    slots: Vec<TaskSlot>,
}

impl MissionBuilder {
    /// Register a prioritized task. Ids follow registration order.
    pub fn task<T: Task + 'static>(
        mut self,
        name: impl Into<String>,
        priority: u32,
        task: T,
    ) -> Self {
        let id = TaskId(self.slots.len());
        self.slots
            .push(TaskSlot::new(id, name, Rank::Priority(priority), task));
        self
    }

    /// Register the fallback. Exactly one is required.
    pub fn fallback<B: Behavior + 'static>(
        mut self,
        name: impl Into<String>,
        task: DefaultTask<B>,
    ) -> Self {
        let id = TaskId(self.slots.len());
        self.slots
            .push(TaskSlot::new(id, name, Rank::Fallback, task));
        self
    }

    /// Validate the assembly and set up every task.
    ///
    /// Reports every problem at once: malformed or duplicate names, a missing
    /// or repeated fallback, and each unmet requirement.
    pub fn build(mut self) -> Result<Mission, PlanError> {
        let problems = self.problems();
        if !problems.is_empty() {
            return Err(PlanError::InvalidMission(problems));
        }
        for slot in &mut self.slots {
            slot.setup(&self.blackboard, &self.control)?;
        }
        info!(tasks = self.slots.len(), "mission assembled");
        Ok(Mission {
            blackboard: self.blackboard,
            control: self.control,
            slots: self.slots,
            active: None,
            predecessor: Predecessor::MissionStart,
            ticks: 0,
        })
    }

    fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen = HashSet::new();
        for slot in &self.slots {
            let name = slot.name();
            if !TASK_NAME.is_match(name) {
                problems.push(format!(
                    "task name '{name}' must match {}",
                    TASK_NAME.as_str()
                ));
            }
            if !seen.insert(name) {
                problems.push(format!("duplicate task name '{name}'"));
            }
            for missing in slot.requirements().missing(&self.blackboard, &self.control) {
                problems.push(format!("{name}: missing {missing}"));
            }
        }
        let fallbacks = self
            .slots
            .iter()
            .filter(|slot| slot.rank().is_fallback())
            .count();
        match fallbacks {
            0 => problems.push("no fallback task".to_string()),
            1 => {}
            n => problems.push(format!("{n} fallback tasks; exactly one is allowed")),
        }
        problems
    }
}

pub struct Mission {
    blackboard: Blackboard,
    control: ControlWrapper,
    slots: Vec<TaskSlot>,
    active: Option<TaskId>,
    predecessor: Predecessor,
    ticks: u64,
}

impl Mission {
    pub fn builder(blackboard: Blackboard, control: ControlWrapper) -> MissionBuilder {
        MissionBuilder {
            blackboard,
            control,
            slots: Vec::new(),
        }
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn control(&self) -> &ControlWrapper {
        &self.control
    }

    pub fn slots(&self) -> &[TaskSlot] {
        &self.slots
    }

    pub fn slot(&self, name: &str) -> Option<&TaskSlot> {
        self.slots.iter().find(|slot| slot.name() == name)
    }

    pub fn active(&self) -> Option<&TaskSlot> {
        self.active.map(|id| &self.slots[id.0])
    }

    pub fn predecessor(&self) -> Predecessor {
        self.predecessor
    }

    /// Ticks completed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Write a blackboard field on behalf of its registered writer.
    pub fn update(
        &mut self,
        writer: &str,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<(), PlanError> {
        self.blackboard.update(writer, field, value)
    }

    /// Run one control tick.
    pub fn tick(&mut self) -> Result<TickReport, PlanError> {
        let tick = self.ticks;
        let mut events = Vec::new();

        if let Some(active) = self.active {
            let ctx = self.context();
            if self.slots[active.0].can_stop(&ctx)? {
                self.deactivate(active);
                events.push(LifecycleEvent::Deactivated {
                    task: self.slots[active.0].name().to_string(),
                });
            }
        }

        if let Some(active) = self.active {
            let rank = self.slots[active.0].rank();
            if let Some(winner) = self.choose(|challenger| preempts(rank, challenger))? {
                self.deactivate(active);
                events.push(LifecycleEvent::Preempted {
                    task: self.slots[active.0].name().to_string(),
                    by: self.slots[winner.0].name().to_string(),
                });
                self.activate(winner)?;
                events.push(LifecycleEvent::Activated {
                    task: self.slots[winner.0].name().to_string(),
                });
            }
        } else if let Some(winner) = self.choose(|_| true)? {
            self.activate(winner)?;
            events.push(LifecycleEvent::Activated {
                task: self.slots[winner.0].name().to_string(),
            });
        }

        let Some(active) = self.active else {
            self.ticks += 1;
            debug!(tick, "no task eligible");
            return Ok(TickReport {
                tick,
                active: None,
                events,
            });
        };

        let mut handle = self.control.handle(active)?;
        let slot = &mut self.slots[active.0];
        slot.tick(&self.blackboard, &mut handle)?;
        self.ticks += 1;
        debug!(tick, task = slot.name(), "tick");
        Ok(TickReport {
            tick,
            active: Some(slot.name().to_string()),
            events,
        })
    }

    /// Run `ticks` ticks, stopping at the first error.
    pub fn run<F: FnMut(&TickReport)>(
        &mut self,
        ticks: u64,
        mut on_tick: F,
    ) -> Result<(), PlanError> {
        for _ in 0..ticks {
            let report = self.tick()?;
            on_tick(&report);
        }
        Ok(())
    }

    fn context(&self) -> EvalContext<'_> {
        EvalContext::new(&self.blackboard, &self.slots, self.predecessor)
    }

    fn choose(&self, admit: impl Fn(Rank) -> bool) -> Result<Option<TaskId>, PlanError> {
        let ctx = self.context();
        let mut eligible = Vec::new();
        for slot in &self.slots {
            if admit(slot.rank()) && slot.can_start(&ctx)? {
                eligible.push(Candidate {
                    id: slot.id(),
                    name: slot.name(),
                    rank: slot.rank(),
                });
            }
        }
        Ok(select(&eligible).map(|candidate| candidate.id))
    }

    fn activate(&mut self, id: TaskId) -> Result<(), PlanError> {
        self.control.grant(id)?;
        let slot = &mut self.slots[id.0];
        slot.activate();
        self.active = Some(id);
        self.predecessor = Predecessor::Task(id);
        info!(
            tick = self.ticks,
            task = slot.name(),
            kind = slot.kind(),
            "task activated"
        );
        Ok(())
    }

    fn deactivate(&mut self, id: TaskId) {
        self.control.revoke();
        let slot = &mut self.slots[id.0];
        slot.deactivate();
        self.active = None;
        info!(tick = self.ticks, task = slot.name(), "task deactivated");
    }
}
