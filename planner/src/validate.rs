//! Validation helpers for a planner workspace.

use std::path::Path;

use anyhow::{Context, Result};

use crate::io::config::load_config;
use crate::io::init::PlannerPaths;
use crate::io::mission_store::load_plan;

/// What a valid mission contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateOutcome {
    /// Prioritized tasks, fallback excluded.
    pub tasks: usize,
    pub fallback: String,
}

/// Validate config, mission schema and invariants, then assemble the mission
/// so every task requirement is checked against the blackboard and channels.
pub fn validate_planner(root: &Path, mission: Option<&Path>) -> Result<ValidateOutcome> {
    let paths = PlannerPaths::new(root);
    load_config(&paths.config_path).with_context(|| "load planner.toml")?;

    let mission_path = mission.unwrap_or(paths.mission_path.as_path());
    let plan = load_plan(mission_path)?;
    let mission = plan
        .assemble()
        .with_context(|| format!("assemble mission {}", mission_path.display()))?;
    let fallback = mission
        .slots()
        .iter()
        .find(|slot| slot.rank().is_fallback())
        .map(|slot| slot.name().to_string())
        .unwrap_or_default();

    Ok(ValidateOutcome {
        tasks: mission.slots().len() - 1,
        fallback,
    })
}
