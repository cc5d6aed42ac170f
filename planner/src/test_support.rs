//! Test-only fixtures for blackboards, control channels and scripted tasks.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::blackboard::Blackboard;
use crate::core::condition::BoxedCondition;
use crate::core::control::{ControlHandle, ControlWrapper};
use crate::core::data_conditions::FlagIs;
use crate::core::requirement::Requirement;
use crate::core::task::Task;
use crate::error::PlanError;

pub use crate::plan::PERCEPTION;

/// Blackboard with the given flags, all owned by [`PERCEPTION`].
pub fn flag_board(flags: &[(&str, bool)]) -> Blackboard {
    let mut data = Blackboard::new();
    for (field, value) in flags {
        data.declare(*field, PERCEPTION, *value)
            .expect("fixture fields are declared once");
    }
    data
}

/// Differential-drive channels: `velocity` and `turnrate`.
pub fn drive_control() -> ControlWrapper {
    ControlWrapper::with_channels(["velocity", "turnrate"])
}

/// Task that starts on one flag, stops on another, and drives at a fixed speed.
#[derive(Debug, Clone)]
pub struct FlagTask {
    start: String,
    stop: String,
    speed: f64,
}

impl FlagTask {
    pub fn new(start: &str, stop: &str, speed: f64) -> Self {
        Self {
            start: start.to_string(),
            stop: stop.to_string(),
            speed,
        }
    }
}

impl Task for FlagTask {
    fn requirements(&self) -> Requirement {
        Requirement::new()
            .field(self.start.as_str())
            .field(self.stop.as_str())
            .channel("velocity")
    }

    fn start_conditions(&self) -> BoxedCondition {
        Box::new(FlagIs::new(self.start.as_str(), true))
    }

    fn stop_conditions(&self) -> BoxedCondition {
        Box::new(FlagIs::new(self.stop.as_str(), true))
    }

    fn tick(
        &mut self,
        _data: &Blackboard,
        control: &mut ControlHandle<'_>,
    ) -> Result<(), PlanError> {
        control.set("velocity", self.speed)
    }
}

/// Scratch directory removed on drop.
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create temp dir")?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `name` under the root and return the full path.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(name);
        std::fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }
}
