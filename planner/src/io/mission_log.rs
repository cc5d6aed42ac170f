//! Mission log: the product record of a run, separate from tracing.
//!
//! Each entry is `<secs>.<4-digit fraction> <tick> <task> % <message>`, where
//! `task` is the active task or `-` when idle. Lines starting with `%` are
//! column headers, so the file loads directly into numeric tools.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

const HEADER: &str = "\
% Mission planner logfile
% 1 \tTime (sec) since mission start
% 2 \tTick
% 3 \tActive task (- when idle)
% 4 \t% Message
";

/// Format one entry without a trailing newline.
pub fn format_entry(elapsed: Duration, tick: u64, task: Option<&str>, message: &str) -> String {
    format!(
        "{}.{:04} {} {} % {}",
        elapsed.as_secs(),
        elapsed.subsec_micros() / 100,
        tick,
        task.unwrap_or("-"),
        message
    )
}

/// Sink for mission log entries: a file, stdout, both, or neither.
pub struct MissionLog {
    file: Option<BufWriter<File>>,
    print: bool,
}

impl MissionLog {
    /// Create (truncate) the log file at `path` and write the header.
    pub fn create(path: &Path, print: bool) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut file = BufWriter::new(file);
        file.write_all(HEADER.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        Ok(Self {
            file: Some(file),
            print,
        })
    }

    /// A log that only echoes to stdout, if at all.
    pub fn stdout_only(print: bool) -> Self {
        Self { file: None, print }
    }

    pub fn entry(
        &mut self,
        elapsed: Duration,
        tick: u64,
        task: Option<&str>,
        message: &str,
    ) -> Result<()> {
        let line = format_entry(elapsed, tick, task, message);
        if let Some(file) = &mut self.file {
            writeln!(file, "{line}").context("write mission log entry")?;
        }
        if self.print {
            println!("{line}");
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(file) = &mut self.file {
            file.flush().context("flush mission log")?;
        }
        Ok(())
    }
}
