//! Static declaration of what a task reads and writes.

use std::collections::BTreeSet;

use crate::core::blackboard::Blackboard;
use crate::core::control::ControlWrapper;
use crate::error::PlanError;

/// Blackboard fields and control channels a task depends on.
///
/// Built once when the task is constructed and checked before the mission
/// ticks, so a missing dependency never surfaces mid-mission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requirement {
    fields: BTreeSet<String>,
    channels: BTreeSet<String>,
}

impl Requirement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into());
        self
    }

    pub fn channel(mut self, name: impl Into<String>) -> Self {
        self.channels.insert(name.into());
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    pub fn channels(&self) -> impl Iterator<Item = &str> {
        self.channels.iter().map(String::as_str)
    }

    /// Describe every dependency not provided, fields first.
    pub fn missing(&self, data: &Blackboard, control: &ControlWrapper) -> Vec<String> {
        let fields = self
            .fields
            .iter()
            .filter(|field| !data.contains(field))
            .map(|field| format!("field '{field}'"));
        let channels = self
            .channels
            .iter()
            .filter(|channel| !control.has_channel(channel))
            .map(|channel| format!("channel '{channel}'"));
        fields.chain(channels).collect()
    }

    pub fn check(
        &self,
        task: &str,
        data: &Blackboard,
        control: &ControlWrapper,
    ) -> Result<(), PlanError> {
        let missing = self.missing(data, control);
        if missing.is_empty() {
            return Ok(());
        }
        Err(PlanError::UnmetRequirements {
            task: task.to_string(),
            missing,
        })
    }
}
