//! Behavior-arbitration planner.
//!
//! Loads a mission (`mission.json`) and ticks it: on every tick exactly one
//! task holds the control channels, chosen by start/stop conditions over a
//! shared blackboard.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use planner::exit_codes;
use planner::io::init::{InitOptions, init_planner};
use planner::logging;
use planner::run::{RunOptions, RunStop, run_mission};
use planner::validate::validate_planner;

#[derive(Parser)]
#[command(
    name = "planner",
    version,
    about = "Tick-driven behavior arbitration for mobile robots"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `planner.toml` and a sample `mission.json`.
    Init {
        /// Overwrite existing files.
        #[arg(short, long)]
        force: bool,
    },
    /// Check config and mission (schema, invariants, task requirements).
    Validate {
        /// Mission file to check instead of `mission.json`.
        #[arg(long)]
        mission: Option<PathBuf>,
    },
    /// Run the mission and print the active task on every tick.
    Run {
        /// Mission file to run instead of `mission.json`.
        #[arg(long)]
        mission: Option<PathBuf>,
        /// Ticks to run; defaults to `max_ticks` from `planner.toml`.
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        ticks: Option<u64>,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = Path::new(".");
    match cli.command {
        Command::Init { force } => cmd_init(root, force),
        Command::Validate { mission } => cmd_validate(root, mission.as_deref()),
        Command::Run { mission, ticks } => cmd_run(root, RunOptions { mission, ticks }),
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_planner(root, &InitOptions { force })?;
    println!("wrote {}", paths.config_path.display());
    println!("wrote {}", paths.mission_path.display());
    Ok(exit_codes::OK)
}

fn cmd_validate(root: &Path, mission: Option<&Path>) -> Result<i32> {
    let outcome = validate_planner(root, mission)?;
    println!(
        "ok: {} tasks, fallback '{}'",
        outcome.tasks, outcome.fallback
    );
    Ok(exit_codes::OK)
}

fn cmd_run(root: &Path, options: RunOptions) -> Result<i32> {
    let outcome = run_mission(root, &options, |report| {
        let active = report.active.as_deref().unwrap_or("-");
        println!("{} {active}", report.tick);
    })?;
    let code = match outcome.stop {
        RunStop::Disabled => {
            eprintln!("run disabled in planner.toml");
            exit_codes::DISABLED
        }
        RunStop::Finished { active: Some(_) } => exit_codes::OK,
        RunStop::Finished { active: None } => exit_codes::IDLE,
    };
    Ok(code)
}
