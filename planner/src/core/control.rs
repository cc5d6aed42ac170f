//! Actuation output boundary.
//!
//! A `ControlWrapper` holds the last command written to each actuation
//! channel. Exactly one task holds the write grant at a time; writes go
//! through a [`ControlHandle`] that only the grant holder can obtain.

use std::collections::BTreeMap;

use crate::core::task::TaskId;
use crate::error::PlanError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlWrapper {
    channels: BTreeMap<String, f64>,
    holder: Option<TaskId>,
}

impl ControlWrapper {
    /// Wire the given channels, each starting at `0.0`.
    pub fn with_channels<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            channels: channels
                .into_iter()
                .map(|name| (name.into(), 0.0))
                .collect(),
            holder: None,
        }
    }

    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Last command written to `channel`.
    pub fn value(&self, channel: &str) -> Option<f64> {
        self.channels.get(channel).copied()
    }

    pub fn holder(&self) -> Option<TaskId> {
        self.holder
    }

    /// Give `task` write access. Fails while another task still holds it.
    pub fn grant(&mut self, task: TaskId) -> Result<(), PlanError> {
        match self.holder {
            Some(holder) if holder != task => Err(PlanError::ControlBusy { holder, task }),
            _ => {
                self.holder = Some(task);
                Ok(())
            }
        }
    }

    /// Withdraw write access, returning the previous holder.
    pub fn revoke(&mut self) -> Option<TaskId> {
        self.holder.take()
    }

    /// Borrow a write handle on behalf of `task`.
    pub fn handle(&mut self, task: TaskId) -> Result<ControlHandle<'_>, PlanError> {
        if self.holder != Some(task) {
            return Err(PlanError::ControlNotGranted { task });
        }
        Ok(ControlHandle { control: self })
    }
}

/// Write access to actuation channels for the grant holder, valid for one tick.
#[derive(Debug)]
pub struct ControlHandle<'a> {
    control: &'a mut ControlWrapper,
}

impl ControlHandle<'_> {
    pub fn set(&mut self, channel: &str, value: f64) -> Result<(), PlanError> {
        let slot = self
            .control
            .channels
            .get_mut(channel)
            .ok_or_else(|| PlanError::UnknownChannel(channel.to_string()))?;
        *slot = value;
        Ok(())
    }
}
