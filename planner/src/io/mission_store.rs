//! Mission plan load/save helpers with schema + invariant validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;

use crate::core::invariants::validate_invariants;
use crate::plan::MissionPlan;

pub const MISSION_SCHEMA: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/schemas/mission.schema.json"
));

/// Load and validate a mission plan from disk (schema + invariants).
pub fn load_plan(path: &Path) -> Result<MissionPlan> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read mission {}", path.display()))?;
    parse_plan(&contents).with_context(|| format!("load mission {}", path.display()))
}

/// Validate and deserialize a mission plan from JSON text.
pub fn parse_plan(contents: &str) -> Result<MissionPlan> {
    let value: Value = serde_json::from_str(contents).context("parse mission json")?;
    validate_schema(&value)?;
    let plan: MissionPlan = serde_json::from_value(value).context("deserialize mission")?;
    let errors = validate_invariants(&plan);
    if !errors.is_empty() {
        return Err(anyhow!("mission invariants failed: {}", errors.join("; ")));
    }
    Ok(plan)
}

/// Write a plan as pretty JSON with a trailing newline.
pub fn write_plan(path: &Path, plan: &MissionPlan) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(plan)?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write mission {}", path.display()))
}

fn validate_schema(instance: &Value) -> Result<()> {
    let schema: Value = serde_json::from_str(MISSION_SCHEMA).context("parse mission schema")?;
    let compiled = validator_for(&schema).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(instance) {
        let messages = compiled
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "mission schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}
