//! Semantic invariants of a mission plan not expressible via JSON Schema.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::core::blackboard::Value;
use crate::plan::{ConditionPlan, MissionPlan};

/// Task names are lowercase identifiers; they appear in logs and flow conditions.
pub static TASK_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_-]*$").expect("task name pattern is valid")
});

/// Check semantic invariants not expressible in JSON Schema:
/// - Task names well-formed and unique, fallback included
/// - Channels unique
/// - Every field a condition, `requires` or the timeline mentions is declared
/// - `follow_previous` targets name a task
/// - Stop conditions never follow back into themselves, directly or through a
///   chain of `follow_previous` targets
/// - `close_to` has exactly one target and a positive `eps`
/// - Timeline ticks non-decreasing and writes keep the declared type
pub fn validate_invariants(plan: &MissionPlan) -> Vec<String> {
    let mut errors = Vec::new();

    let names: Vec<&str> = plan
        .tasks
        .iter()
        .map(|task| task.name.as_str())
        .chain(std::iter::once(plan.fallback.name.as_str()))
        .collect();
    let mut seen = HashSet::new();
    for name in &names {
        if !TASK_NAME.is_match(name) {
            errors.push(format!(
                "task name '{name}' must match {}",
                TASK_NAME.as_str()
            ));
        }
        if !seen.insert(*name) {
            errors.push(format!("duplicate task name '{name}'"));
        }
    }

    let mut channels = HashSet::new();
    for channel in &plan.channels {
        if !channels.insert(channel.as_str()) {
            errors.push(format!("duplicate channel '{channel}'"));
        }
    }

    for task in &plan.tasks {
        for (role, condition) in [("start", &task.start), ("stop", &task.stop)] {
            let path = format!("{}.{role}", task.name);
            for field in condition.fields() {
                if !plan.blackboard.contains_key(field) {
                    errors.push(format!("{path}: field '{field}' is not on the blackboard"));
                }
            }
            for target in condition.task_refs() {
                if !seen.contains(target) {
                    errors.push(format!(
                        "{path}: follow_previous names unknown task '{target}'"
                    ));
                }
            }
            validate_condition(condition, &path, &mut errors);
        }
        // While a task is active the scheduler's predecessor is the task itself.
        if task.stop.follows_predecessor() {
            errors.push(format!(
                "{}.stop: follow_previous without a task follows '{}' itself",
                task.name, task.name
            ));
        }
        for field in &task.requires {
            if !plan.blackboard.contains_key(field) {
                errors.push(format!(
                    "{}.requires: field '{field}' is not on the blackboard",
                    task.name
                ));
            }
        }
    }

    errors.extend(stop_chain_cycles(plan));

    let sorted = plan
        .timeline
        .windows(2)
        .all(|pair| pair[0].tick <= pair[1].tick);
    if !sorted {
        errors.push("timeline must be sorted by tick".to_string());
    }
    for entry in &plan.timeline {
        for (field, value) in &entry.set {
            match plan.blackboard.get(field) {
                None => errors.push(format!(
                    "timeline tick {}: field '{field}' is not on the blackboard",
                    entry.tick
                )),
                Some(initial) if !same_type(initial, value) => errors.push(format!(
                    "timeline tick {}: field '{field}' holds a {}, not a {}",
                    entry.tick,
                    initial.type_name(),
                    value.type_name()
                )),
                Some(_) => {}
            }
        }
    }

    errors
}

fn validate_condition(condition: &ConditionPlan, path: &str, errors: &mut Vec<String>) {
    match condition {
        ConditionPlan::CloseTo {
            field,
            target,
            target_field,
            eps,
        } => {
            if target.is_some() == target_field.is_some() {
                errors.push(format!(
                    "{path}: close_to on '{field}' needs exactly one of target or target_field"
                ));
            }
            if let Some(eps) = eps
                && (eps.is_nan() || *eps <= 0.0)
            {
                errors.push(format!("{path}: close_to on '{field}' needs eps > 0"));
            }
        }
        ConditionPlan::All { conditions } | ConditionPlan::Any { conditions } => {
            for inner in conditions {
                validate_condition(inner, path, errors);
            }
        }
        ConditionPlan::Not { condition } => validate_condition(condition, path, errors),
        _ => {}
    }
}

/// Following a task evaluates its stop condition, so a loop of stop-condition
/// targets never reaches a verdict.
fn stop_chain_cycles(plan: &MissionPlan) -> Vec<String> {
    let targets: HashMap<&str, Vec<&str>> = plan
        .tasks
        .iter()
        .map(|task| (task.name.as_str(), task.stop.task_refs()))
        .collect();
    let mut done = HashSet::new();
    let mut errors = Vec::new();
    for task in &plan.tasks {
        let mut path = Vec::new();
        walk_stop_chain(&task.name, &targets, &mut path, &mut done, &mut errors);
    }
    errors
}

fn walk_stop_chain<'a>(
    name: &'a str,
    targets: &HashMap<&'a str, Vec<&'a str>>,
    path: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
    errors: &mut Vec<String>,
) {
    if done.contains(name) {
        return;
    }
    if let Some(start) = path.iter().position(|seen| *seen == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name);
        errors.push(format!(
            "follow_previous cycle in stop conditions: {}",
            cycle.join(" -> ")
        ));
        return;
    }
    path.push(name);
    for next in targets.get(name).into_iter().flatten() {
        walk_stop_chain(*next, targets, path, done, errors);
    }
    path.pop();
    done.insert(name);
}

fn same_type(left: &Value, right: &Value) -> bool {
    std::mem::discriminant(left) == std::mem::discriminant(right)
}
