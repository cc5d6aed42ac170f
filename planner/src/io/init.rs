//! Initialization helpers for a planner workspace.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};

use super::config::{PlannerConfig, write_config};
use super::mission_store::write_plan;
use crate::core::blackboard::Value;
use crate::plan::{
    BehaviorPlan, ConditionPlan, FallbackPlan, MissionPlan, TaskPlan, TimelineEntry,
};

/// Canonical file locations for a planner workspace root.
#[derive(Debug, Clone)]
pub struct PlannerPaths {
    pub root: PathBuf,
    pub config_path: PathBuf,
    pub mission_path: PathBuf,
}

impl PlannerPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            config_path: root.join("planner.toml"),
            mission_path: root.join("mission.json"),
            root,
        }
    }

    /// Mission log location from `cfg`, resolved against the root.
    pub fn log_path(&self, cfg: &PlannerConfig) -> PathBuf {
        self.root.join(&cfg.log_path)
    }
}

/// Options for `init_planner`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing planner files.
    pub force: bool,
}

/// Write `planner.toml` and a sample `mission.json` into `root`.
///
/// Fails if either file exists unless `options.force` is set.
pub fn init_planner(root: &Path, options: &InitOptions) -> Result<PlannerPaths> {
    let paths = PlannerPaths::new(root);
    for path in [&paths.config_path, &paths.mission_path] {
        if path.exists() && !options.force {
            return Err(anyhow!(
                "planner init: {} already exists (use --force to overwrite)",
                path.display()
            ));
        }
    }
    write_config(&paths.config_path, &PlannerConfig::default())?;
    write_plan(&paths.mission_path, &sample_plan())?;
    Ok(paths)
}

/// Turn to a goal heading, follow a line while it is visible, and back off a
/// bumper hit; halt otherwise.
pub fn sample_plan() -> MissionPlan {
    let flag = |field: &str, value: bool| ConditionPlan::Flag {
        field: field.to_string(),
        value,
    };
    MissionPlan {
        blackboard: BTreeMap::from([
            ("heading".to_string(), Value::Number(0.0)),
            ("goal_heading".to_string(), Value::Number(1.0)),
            ("line_visible".to_string(), Value::Flag(false)),
            ("bumper".to_string(), Value::Flag(false)),
        ]),
        channels: vec!["velocity".to_string(), "turnrate".to_string()],
        tasks: vec![
            TaskPlan {
                name: "turn_to_goal".to_string(),
                priority: 1,
                behavior: BehaviorPlan::Drive {
                    velocity: 0.0,
                    turnrate: 0.5,
                },
                start: ConditionPlan::MissionStart,
                stop: ConditionPlan::CloseTo {
                    field: "heading".to_string(),
                    target: None,
                    target_field: Some("goal_heading".to_string()),
                    eps: None,
                },
                requires: Vec::new(),
            },
            TaskPlan {
                name: "follow_line".to_string(),
                priority: 2,
                behavior: BehaviorPlan::Drive {
                    velocity: 0.3,
                    turnrate: 0.0,
                },
                start: flag("line_visible", true),
                stop: flag("line_visible", false),
                requires: Vec::new(),
            },
            TaskPlan {
                name: "escape".to_string(),
                priority: 9,
                behavior: BehaviorPlan::Drive {
                    velocity: -0.2,
                    turnrate: 0.0,
                },
                start: flag("bumper", true),
                stop: flag("bumper", false),
                requires: Vec::new(),
            },
        ],
        fallback: FallbackPlan {
            name: "idle".to_string(),
            behavior: BehaviorPlan::Halt,
        },
        timeline: vec![
            entry(3, "heading", Value::Number(0.998)),
            entry(6, "line_visible", Value::Flag(true)),
            entry(15, "line_visible", Value::Flag(false)),
            entry(17, "bumper", Value::Flag(true)),
            entry(19, "bumper", Value::Flag(false)),
        ],
    }
}

fn entry(tick: u64, field: &str, value: Value) -> TimelineEntry {
    TimelineEntry {
        tick,
        set: BTreeMap::from([(field.to_string(), value)]),
    }
}
