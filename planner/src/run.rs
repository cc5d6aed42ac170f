//! Tick loop for `planner run`.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::io::config::load_config;
use crate::io::init::PlannerPaths;
use crate::io::mission_log::MissionLog;
use crate::io::mission_store::load_plan;
use crate::mission::{LifecycleEvent, TickReport};
use crate::plan::PERCEPTION;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Mission file; defaults to `mission.json` under the root.
    pub mission: Option<PathBuf>,
    /// Ticks to run; defaults to the config's `max_ticks`.
    pub ticks: Option<u64>,
}

/// Reason why `run_mission` stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStop {
    /// `run = false` in the config; nothing was ticked.
    Disabled,
    /// All requested ticks ran. `active` is the task holding control at the end.
    Finished { active: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub ticks: u64,
    pub stop: RunStop,
}

/// Load config and mission under `root`, then tick the mission.
///
/// Timeline writes for a tick are applied before that tick runs. Stops on the
/// first error from the mission.
pub fn run_mission<F: FnMut(&TickReport)>(
    root: &Path,
    options: &RunOptions,
    mut on_tick: F,
) -> Result<RunOutcome> {
    let paths = PlannerPaths::new(root);
    let cfg = load_config(&paths.config_path)?;
    if !cfg.run {
        info!("run disabled by config");
        return Ok(RunOutcome {
            ticks: 0,
            stop: RunStop::Disabled,
        });
    }
    let ticks = options.ticks.unwrap_or(cfg.max_ticks);
    if ticks == 0 {
        return Err(anyhow!("tick count must be > 0"));
    }

    let mission_path = options
        .mission
        .as_deref()
        .unwrap_or(paths.mission_path.as_path());
    let plan = load_plan(mission_path)?;
    let mut mission = plan
        .assemble()
        .with_context(|| format!("assemble mission {}", mission_path.display()))?;

    let mut log = if cfg.log {
        MissionLog::create(&paths.log_path(&cfg), cfg.print)?
    } else {
        MissionLog::stdout_only(cfg.print)
    };
    let started = Instant::now();
    log.entry(Duration::ZERO, 0, None, "mission started")?;

    for tick in 0..ticks {
        for (field, value) in plan.writes_at(tick) {
            mission
                .update(PERCEPTION, field, value.clone())
                .with_context(|| format!("timeline write to '{field}' at tick {tick}"))?;
        }
        let report = mission.tick().with_context(|| format!("tick {tick}"))?;
        for event in &report.events {
            log.entry(
                started.elapsed(),
                tick,
                report.active.as_deref(),
                &event_message(event),
            )?;
        }
        on_tick(&report);
        if cfg.tick_period_ms > 0 {
            thread::sleep(Duration::from_millis(cfg.tick_period_ms));
        }
    }

    let active = mission.active().map(|slot| slot.name().to_string());
    log.entry(
        started.elapsed(),
        ticks,
        active.as_deref(),
        "mission finished",
    )?;
    log.flush()?;
    info!(ticks, active = ?active, "mission finished");

    Ok(RunOutcome {
        ticks,
        stop: RunStop::Finished { active },
    })
}

fn event_message(event: &LifecycleEvent) -> String {
    match event {
        LifecycleEvent::Activated { task } => format!("activated {task}"),
        LifecycleEvent::Deactivated { task } => format!("deactivated {task}"),
        LifecycleEvent::Preempted { task, by } => format!("{task} preempted by {by}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::{PlannerConfig, write_config};
    use crate::io::init::{InitOptions, init_planner};
    use crate::test_support::TestDir;

    fn active_per_tick(root: &Path, ticks: u64) -> Vec<String> {
        let mut seen = Vec::new();
        run_mission(
            root,
            &RunOptions {
                ticks: Some(ticks),
                ..RunOptions::default()
            },
            |report| seen.push(report.active.clone().unwrap_or_else(|| "-".to_string())),
        )
        .expect("run");
        seen
    }

    #[test]
    fn sample_mission_follows_its_timeline() {
        let dir = TestDir::new().expect("dir");
        init_planner(dir.root(), &InitOptions { force: false }).expect("init");

        let seen = active_per_tick(dir.root(), 21);
        let expected: Vec<&str> = [
            ("turn_to_goal", 3),
            ("idle", 3),
            ("follow_line", 9),
            ("idle", 2),
            ("escape", 2),
            ("idle", 2),
        ]
        .iter()
        .flat_map(|(task, count)| std::iter::repeat_n(*task, *count))
        .collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn writes_mission_log() {
        let dir = TestDir::new().expect("dir");
        init_planner(dir.root(), &InitOptions { force: false }).expect("init");
        active_per_tick(dir.root(), 8);

        let log = std::fs::read_to_string(dir.root().join("mission.log")).expect("log");
        let entries: Vec<&str> = log.lines().filter(|line| !line.starts_with('%')).collect();
        let messages: Vec<&str> = entries
            .iter()
            .filter_map(|line| line.split_once(" % ").map(|(_, message)| message))
            .collect();
        assert_eq!(
            messages,
            vec![
                "mission started",
                "activated turn_to_goal",
                "deactivated turn_to_goal",
                "activated idle",
                "idle preempted by follow_line",
                "activated follow_line",
                "mission finished",
            ]
        );
        assert!(entries[1].split(' ').nth(1) == Some("0"));
        let handover = "6 follow_line % idle preempted by follow_line";
        assert!(entries[4].ends_with(handover));
    }

    #[test]
    fn disabled_config_ticks_nothing() {
        let dir = TestDir::new().expect("dir");
        let paths = init_planner(dir.root(), &InitOptions { force: false }).expect("init");
        write_config(
            &paths.config_path,
            &PlannerConfig {
                run: false,
                ..PlannerConfig::default()
            },
        )
        .expect("config");

        let outcome = run_mission(dir.root(), &RunOptions::default(), |_| {
            panic!("no tick expected")
        })
        .expect("run");
        assert_eq!(outcome.stop, RunStop::Disabled);
        assert!(!dir.root().join("mission.log").exists());
    }

    #[test]
    fn log_disabled_writes_no_file() {
        let dir = TestDir::new().expect("dir");
        let paths = init_planner(dir.root(), &InitOptions { force: false }).expect("init");
        write_config(
            &paths.config_path,
            &PlannerConfig {
                log: false,
                max_ticks: 4,
                ..PlannerConfig::default()
            },
        )
        .expect("config");

        let outcome = run_mission(dir.root(), &RunOptions::default(), |_| {}).expect("run");
        assert_eq!(outcome.ticks, 4);
        assert_eq!(
            outcome.stop,
            RunStop::Finished {
                active: Some("idle".to_string())
            }
        );
        assert!(!dir.root().join("mission.log").exists());
    }

    #[test]
    fn missing_mission_is_an_error() {
        let dir = TestDir::new().expect("dir");
        let err = run_mission(dir.root(), &RunOptions::default(), |_| {}).expect_err("missing");
        assert!(format!("{err:#}").contains("read mission"));
    }
}
