//! Declarative mission plans (`mission.json`).
//!
//! A plan names the initial blackboard, the control channels, the prioritized
//! tasks with their start and stop conditions, the fallback, and a timeline of
//! scripted blackboard writes. [`MissionPlan::assemble`] turns it into a
//! runnable [`Mission`].

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::behaviors::{ConfiguredBehavior, ConfiguredTask};
use crate::core::blackboard::{Blackboard, Value};
use crate::core::condition::{AllOf, Always, AnyOf, Condition, Never, Not};
use crate::core::control::ControlWrapper;
use crate::core::data_conditions::{Above, Below, CloseTo, FlagIs};
use crate::core::default_task::DefaultTask;
use crate::core::flow::{FollowPreviousTask, MissionStart};
use crate::core::task::TaskId;
use crate::error::PlanError;
use crate::mission::Mission;

/// Writer id owning every blackboard field declared by a plan.
pub const PERCEPTION: &str = "perception";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MissionPlan {
    /// Initial field values.
    #[serde(default)]
    pub blackboard: BTreeMap<String, Value>,
    pub channels: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<TaskPlan>,
    pub fallback: FallbackPlan,
    /// Scripted writes, applied before the tick they name.
    #[serde(default)]
    pub timeline: Vec<TimelineEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskPlan {
    pub name: String,
    pub priority: u32,
    pub behavior: BehaviorPlan,
    pub start: ConditionPlan,
    pub stop: ConditionPlan,
    /// Fields read by the behavior beyond those its conditions mention.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackPlan {
    pub name: String,
    pub behavior: BehaviorPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BehaviorPlan {
    Halt,
    Drive { velocity: f64, turnrate: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimelineEntry {
    pub tick: u64,
    pub set: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConditionPlan {
    Never,
    Always,
    MissionStart,
    FollowPrevious {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task: Option<String>,
    },
    Above {
        field: String,
        value: f64,
    },
    Below {
        field: String,
        value: f64,
    },
    CloseTo {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target_field: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        eps: Option<f64>,
    },
    Flag {
        field: String,
        #[serde(default = "default_flag")]
        value: bool,
    },
    All {
        conditions: Vec<ConditionPlan>,
    },
    Any {
        conditions: Vec<ConditionPlan>,
    },
    Not {
        condition: Box<ConditionPlan>,
    },
}

fn default_flag() -> bool {
    true
}

/// Task names mapped to the ids they get on assembly.
pub type TaskIndex = BTreeMap<String, TaskId>;

impl ConditionPlan {
    /// Build the runtime condition, resolving task names through `index`.
    pub fn build(&self, index: &TaskIndex) -> Result<Rc<dyn Condition>, PlanError> {
        let condition: Rc<dyn Condition> = match self {
            ConditionPlan::Never => Rc::new(Never),
            ConditionPlan::Always => Rc::new(Always),
            ConditionPlan::MissionStart => Rc::new(MissionStart),
            ConditionPlan::FollowPrevious { task: None } => Rc::new(FollowPreviousTask::new()),
            ConditionPlan::FollowPrevious { task: Some(name) } => {
                let id = index
                    .get(name)
                    .copied()
                    .ok_or_else(|| PlanError::UnknownTaskName(name.clone()))?;
                Rc::new(FollowPreviousTask::after(id))
            }
            ConditionPlan::Above { field, value } => Rc::new(Above::new(field.as_str(), *value)),
            ConditionPlan::Below { field, value } => Rc::new(Below::new(field.as_str(), *value)),
            ConditionPlan::CloseTo {
                field,
                target,
                target_field,
                eps,
            } => {
                let close = match (target, target_field) {
                    (Some(target), None) => CloseTo::value(field.as_str(), *target),
                    (None, Some(other)) => CloseTo::field(field.as_str(), other.as_str()),
                    _ => {
                        return Err(PlanError::InvalidMission(vec![format!(
                            "close_to on '{field}' needs exactly one of target or target_field"
                        )]));
                    }
                };
                Rc::new(match eps {
                    Some(eps) => close.with_eps(*eps),
                    None => close,
                })
            }
            ConditionPlan::Flag { field, value } => Rc::new(FlagIs::new(field.as_str(), *value)),
            ConditionPlan::All { conditions } => Rc::new(AllOf(build_all(conditions, index)?)),
            ConditionPlan::Any { conditions } => Rc::new(AnyOf(build_all(conditions, index)?)),
            ConditionPlan::Not { condition } => Rc::new(Not(Box::new(condition.build(index)?))),
        };
        Ok(condition)
    }

    /// Blackboard fields read by this condition, in first-mention order.
    pub fn fields(&self) -> Vec<&str> {
        let mut fields = Vec::new();
        self.collect_fields(&mut fields);
        fields
    }

    /// Task names referenced by flow conditions.
    pub fn task_refs(&self) -> Vec<&str> {
        match self {
            ConditionPlan::FollowPrevious { task: Some(name) } => vec![name.as_str()],
            ConditionPlan::All { conditions } | ConditionPlan::Any { conditions } => {
                conditions
                    .iter()
                    .flat_map(ConditionPlan::task_refs)
                    .collect()
            }
            ConditionPlan::Not { condition } => condition.task_refs(),
            _ => Vec::new(),
        }
    }

    /// True if some `follow_previous` without a task follows the scheduler's
    /// predecessor.
    pub fn follows_predecessor(&self) -> bool {
        match self {
            ConditionPlan::FollowPrevious { task: None } => true,
            ConditionPlan::All { conditions } | ConditionPlan::Any { conditions } => {
                conditions.iter().any(ConditionPlan::follows_predecessor)
            }
            ConditionPlan::Not { condition } => condition.follows_predecessor(),
            _ => false,
        }
    }

    fn collect_fields<'a>(&'a self, fields: &mut Vec<&'a str>) {
        match self {
            ConditionPlan::Never
            | ConditionPlan::Always
            | ConditionPlan::MissionStart
            | ConditionPlan::FollowPrevious { .. } => {}
            ConditionPlan::Above { field, .. }
            | ConditionPlan::Below { field, .. }
            | ConditionPlan::Flag { field, .. } => fields.push(field),
            ConditionPlan::CloseTo {
                field,
                target_field,
                ..
            } => {
                fields.push(field);
                if let Some(other) = target_field {
                    fields.push(other);
                }
            }
            ConditionPlan::All { conditions } | ConditionPlan::Any { conditions } => {
                for condition in conditions {
                    condition.collect_fields(fields);
                }
            }
            ConditionPlan::Not { condition } => condition.collect_fields(fields),
        }
    }
}

fn build_all(
    conditions: &[ConditionPlan],
    index: &TaskIndex,
) -> Result<Vec<Box<dyn Condition>>, PlanError> {
    conditions
        .iter()
        .map(|condition| {
            condition
                .build(index)
                .map(|built| Box::new(built) as Box<dyn Condition>)
        })
        .collect()
}

impl MissionPlan {
    /// Ids in registration order: tasks first, the fallback last.
    pub fn task_index(&self) -> TaskIndex {
        self.tasks
            .iter()
            .map(|task| task.name.clone())
            .chain(std::iter::once(self.fallback.name.clone()))
            .enumerate()
            .map(|(id, name)| (name, TaskId(id)))
            .collect()
    }

    pub fn blackboard(&self) -> Result<Blackboard, PlanError> {
        let mut data = Blackboard::new();
        for (field, value) in &self.blackboard {
            data.declare(field.as_str(), PERCEPTION, value.clone())?;
        }
        Ok(data)
    }

    pub fn control(&self) -> ControlWrapper {
        ControlWrapper::with_channels(self.channels.iter().map(String::as_str))
    }

    /// Writes scheduled before tick `tick`.
    pub fn writes_at(&self, tick: u64) -> impl Iterator<Item = (&str, &Value)> {
        self.timeline
            .iter()
            .filter(move |entry| entry.tick == tick)
            .flat_map(|entry| entry.set.iter())
            .map(|(field, value)| (field.as_str(), value))
    }

    /// Build and set up the mission described by this plan.
    pub fn assemble(&self) -> Result<Mission, PlanError> {
        let index = self.task_index();
        let mut builder = Mission::builder(self.blackboard()?, self.control());
        for task in &self.tasks {
            builder = builder.task(
                task.name.as_str(),
                task.priority,
                ConfiguredTask::from_plan(task, &index)?,
            );
        }
        builder
            .fallback(
                self.fallback.name.as_str(),
                DefaultTask::new(ConfiguredBehavior::from(&self.fallback.behavior)),
            )
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::condition::EvalContext;

    fn parse(json: &str) -> MissionPlan {
        serde_json::from_str(json).expect("parse plan")
    }

    const PATROL: &str = r#"{
        "blackboard": { "heading": 1.0, "goal": 1.0, "bumper": false },
        "channels": ["velocity", "turnrate"],
        "tasks": [
            {
                "name": "turn",
                "priority": 1,
                "behavior": { "kind": "drive", "velocity": 0.0, "turnrate": 0.5 },
                "start": { "kind": "mission_start" },
                "stop": { "kind": "close_to", "field": "heading", "target_field": "goal" }
            },
            {
                "name": "escape",
                "priority": 9,
                "behavior": { "kind": "drive", "velocity": -0.2, "turnrate": 0.0 },
                "start": { "kind": "flag", "field": "bumper" },
                "stop": { "kind": "not", "condition": { "kind": "flag", "field": "bumper" } }
            }
        ],
        "fallback": { "name": "idle", "behavior": { "kind": "halt" } },
        "timeline": [ { "tick": 2, "set": { "bumper": true } } ]
    }"#;

    #[test]
    fn parses_conditions_by_kind() {
        let plan = parse(PATROL);
        assert_eq!(plan.tasks.len(), 2);
        assert_eq!(
            plan.tasks[0].stop,
            ConditionPlan::CloseTo {
                field: "heading".to_string(),
                target: None,
                target_field: Some("goal".to_string()),
                eps: None,
            }
        );
        assert_eq!(
            plan.tasks[1].start,
            ConditionPlan::Flag {
                field: "bumper".to_string(),
                value: true
            }
        );
        assert_eq!(plan.blackboard.get("bumper"), Some(&Value::Flag(false)));
        assert_eq!(plan.blackboard.get("goal"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn unknown_condition_kind_is_rejected() {
        let err = serde_json::from_str::<ConditionPlan>(r#"{ "kind": "sometimes" }"#)
            .expect_err("unknown kind");
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn fields_walk_nested_conditions() {
        let condition = ConditionPlan::All {
            conditions: vec![
                ConditionPlan::Above {
                    field: "range".to_string(),
                    value: 0.5,
                },
                ConditionPlan::Not {
                    condition: Box::new(ConditionPlan::CloseTo {
                        field: "x".to_string(),
                        target: None,
                        target_field: Some("x_goal".to_string()),
                        eps: Some(0.01),
                    }),
                },
                ConditionPlan::FollowPrevious {
                    task: Some("dock".to_string()),
                },
            ],
        };
        assert_eq!(condition.fields(), vec!["range", "x", "x_goal"]);
        assert_eq!(condition.task_refs(), vec!["dock"]);
    }

    #[test]
    fn build_resolves_follow_targets() {
        let plan = parse(PATROL);
        let index = plan.task_index();
        assert_eq!(index.get("idle"), Some(&TaskId(2)));

        let err = ConditionPlan::FollowPrevious {
            task: Some("missing".to_string()),
        }
        .build(&index)
        .expect_err("unknown task");
        assert_eq!(err, PlanError::UnknownTaskName("missing".to_string()));
    }

    #[test]
    fn close_to_needs_exactly_one_target() {
        let index = TaskIndex::new();
        let err = ConditionPlan::CloseTo {
            field: "x".to_string(),
            target: Some(1.0),
            target_field: Some("y".to_string()),
            eps: None,
        }
        .build(&index)
        .expect_err("ambiguous target");
        let message = err.to_string();
        assert!(message.contains("exactly one of target or target_field"));
    }

    #[test]
    fn built_conditions_evaluate_against_the_blackboard() {
        let plan = parse(PATROL);
        let data = plan.blackboard().expect("blackboard");
        let ctx = EvalContext::detached(&data);
        let index = plan.task_index();
        let verdict = |condition: &ConditionPlan| {
            let built = condition.build(&index).expect("build");
            built.test(&ctx).expect("test")
        };
        assert!(verdict(&plan.tasks[0].stop));
        assert!(!verdict(&plan.tasks[1].start));
        assert!(verdict(&plan.tasks[1].stop));
    }

    #[test]
    fn timeline_writes_are_keyed_by_tick() {
        let plan = parse(PATROL);
        assert_eq!(plan.writes_at(0).count(), 0);
        let writes: Vec<_> = plan.writes_at(2).collect();
        assert_eq!(writes, vec![("bumper", &Value::Flag(true))]);
    }

    #[test]
    fn assembles_and_runs() {
        let plan = parse(PATROL);
        let mut mission = plan.assemble().expect("assemble");
        let mut active = Vec::new();
        for tick in 0..3 {
            for (field, value) in plan.writes_at(tick) {
                mission
                    .update(PERCEPTION, field, value.clone())
                    .expect("write");
            }
            active.push(mission.tick().expect("tick").active);
        }
        // heading already at goal: turn starts at mission start then yields
        let active: Vec<_> = active.iter().map(|name| name.as_deref()).collect();
        assert_eq!(active, vec![Some("turn"), Some("idle"), Some("escape")]);
        assert_eq!(mission.control().value("velocity"), Some(-0.2));
    }

    #[test]
    fn assembly_reports_missing_channels() {
        let mut plan = parse(PATROL);
        plan.channels = vec!["velocity".to_string()];
        let err = plan.assemble().err().expect("missing channel");
        let PlanError::InvalidMission(problems) = err else {
            panic!("unexpected error {err}");
        };
        let has = |problem: &str| problems.iter().any(|p| p == problem);
        assert!(has("turn: missing channel 'turnrate'"));
        assert!(has("idle: missing channel 'turnrate'"));
    }
}
