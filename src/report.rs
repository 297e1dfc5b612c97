//! Report snapshots and pluggable reporters.
//!
//! All reporters implement the `Reporter` trait and are designed to be:
//! - Non-panicking: errors are logged to stderr but never propagate
//! - Quiet on empty input: an empty report produces no output at all
//! - Deterministic: identical reports produce identical output

use crate::config::ProfileMode;
use crate::site::SiteId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Header of a timing report.
pub const TIMING_HEADER: &str = "===== Time Spent (us) =====";
/// Header of a coverage report.
pub const COVERAGE_HEADER: &str = "===== Function Call Counts =====";

/// Aggregated numbers for one site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteStats {
    /// `file:line:function`
    pub site: SiteId,
    /// Completed executions.
    pub count: u64,
    /// Total elapsed microseconds.
    pub total_micros: u64,
}

impl SiteStats {
    /// Mean microseconds per execution.
    pub fn average_micros(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.total_micros as f64 / self.count as f64)
    }

    pub fn total_duration(&self) -> Duration {
        Duration::from_micros(self.total_micros)
    }

    /// One report line in the stable text format.
    pub fn to_line(&self, mode: ProfileMode) -> String {
        match mode {
            ProfileMode::Timing => format!(
                "{}: {} us, {} calls",
                self.site, self.total_micros, self.count
            ),
            ProfileMode::Coverage => format!("{}: {} calls", self.site, self.count),
        }
    }
}

/// Point-in-time snapshot of an aggregator, already sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Mode of the aggregator the snapshot came from.
    pub mode: ProfileMode,
    entries: Vec<SiteStats>,
}

impl Report {
    pub(crate) fn new(mode: ProfileMode, entries: Vec<SiteStats>) -> Self {
        Self { mode, entries }
    }

    /// Sites in report order.
    pub fn entries(&self) -> &[SiteStats] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry for `site`, if present.
    pub fn find(&self, site: &SiteId) -> Option<&SiteStats> {
        self.entries.iter().find(|e| &e.site == site)
    }

    /// Executions summed over all sites.
    pub fn total_calls(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.count))
    }

    /// Microseconds summed over all sites. Nested scopes are counted once per
    /// site they ran in.
    pub fn total_micros(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.total_micros))
    }

    /// Render the text report: a header line, then one line per site.
    pub fn to_text(&self) -> String {
        let header = match self.mode {
            ProfileMode::Timing => TIMING_HEADER,
            ProfileMode::Coverage => COVERAGE_HEADER,
        };
        let mut output = String::with_capacity(header.len() + 1 + self.entries.len() * 64);
        output.push_str(header);
        output.push('\n');
        for entry in &self.entries {
            output.push_str(&entry.to_line(self.mode));
            output.push('\n');
        }
        output
    }

    /// Load a report previously written by [`JsonReporter`].
    pub fn load(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

/// Trait for report destinations.
pub trait Reporter: Send + Sync {
    /// Emit `report`. Implementations swallow and log their own failures.
    fn report(&self, report: &Report);
}

/// Writes the text report to a file, replacing earlier content.
pub struct TextReporter {
    path: PathBuf,
}

impl TextReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `report`, returning the error instead of logging it.
    pub fn write_report(&self, report: &Report) -> Result<()> {
        let file = File::create(&self.path)
            .with_context(|| format!("cannot open '{}' for writing", self.path.display()))?;
        let mut out = BufWriter::new(file);
        out.write_all(report.to_text().as_bytes())
            .and_then(|_| out.flush())
            .with_context(|| format!("cannot write '{}'", self.path.display()))?;
        Ok(())
    }
}

impl Reporter for TextReporter {
    fn report(&self, report: &Report) {
        if report.is_empty() {
            return;
        }
        match self.write_report(report) {
            Ok(()) => eprintln!("  Report written to: {}", self.path.display()),
            Err(e) => eprintln!("Warning: failed to write report: {:#}", e),
        }
    }
}

/// Writes the report as pretty-printed JSON.
pub struct JsonReporter {
    path: PathBuf,
}

impl JsonReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_report_inner(&self, report: &Report) -> Result<()> {
        let json = serde_json::to_string_pretty(report).context("cannot serialize report")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("cannot write '{}'", self.path.display()))?;
        Ok(())
    }
}

impl Reporter for JsonReporter {
    fn report(&self, report: &Report) {
        if report.is_empty() {
            return;
        }
        match self.write_report_inner(report) {
            Ok(()) => eprintln!("  JSON report written to: {}", self.path.display()),
            Err(e) => eprintln!("Warning: failed to write JSON report: {:#}", e),
        }
    }
}

/// Fixed width for the site column in console output.
const SITE_WIDTH: usize = 48;
/// Fixed width for numeric columns in console output.
const NUMBER_WIDTH: usize = 12;

/// Prints a summary table to stdout.
///
/// The whole table is written under one lock so concurrent reporters cannot
/// interleave lines.
pub struct ConsoleReporter {
    output_lock: Mutex<()>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            output_lock: Mutex::new(()),
        }
    }

    fn format_table(report: &Report) -> String {
        let mut output = String::new();
        output.push_str("---------------------------------------------------------------\n");
        match report.mode {
            ProfileMode::Timing => output.push_str(&format!(
                "  {:<site$} {:>num$} {:>num$} {:>num$}\n",
                "Site",
                "Calls",
                "Total",
                "Avg",
                site = SITE_WIDTH,
                num = NUMBER_WIDTH
            )),
            ProfileMode::Coverage => output.push_str(&format!(
                "  {:<site$} {:>num$}\n",
                "Site",
                "Calls",
                site = SITE_WIDTH,
                num = NUMBER_WIDTH
            )),
        }
        output.push_str("---------------------------------------------------------------\n");

        for entry in report.entries() {
            let line = match report.mode {
                ProfileMode::Timing => {
                    let avg = entry
                        .average_micros()
                        .map(|us| format_duration(Duration::from_secs_f64(us / 1_000_000.0)))
                        .unwrap_or_default();
                    format!(
                        "  {:<site$} {:>num$} {:>num$} {:>num$}\n",
                        entry.site.as_str(),
                        entry.count,
                        format_duration(entry.total_duration()),
                        avg,
                        site = SITE_WIDTH,
                        num = NUMBER_WIDTH
                    )
                }
                ProfileMode::Coverage => format!(
                    "  {:<site$} {:>num$}\n",
                    entry.site.as_str(),
                    entry.count,
                    site = SITE_WIDTH,
                    num = NUMBER_WIDTH
                ),
            };
            output.push_str(&line);
        }

        output.push_str("---------------------------------------------------------------\n");
        output.push_str(&format!(
            "  {} sites, {} calls\n",
            report.len(),
            report.total_calls()
        ));
        output
    }

    fn write_stdout(&self, message: &str) {
        // Ignore poison; the guard protects no data
        let _guard = self.output_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(message.as_bytes()) {
            let _ = writeln!(
                std::io::stderr(),
                "Warning: failed to write to stdout: {}",
                e
            );
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, report: &Report) {
        if report.is_empty() {
            return;
        }
        self.write_stdout(&Self::format_table(report));
    }
}

/// Combines multiple reporters.
pub struct MultiReporter {
    reporters: Vec<Box<dyn Reporter>>,
}

impl MultiReporter {
    pub fn new(reporters: Vec<Box<dyn Reporter>>) -> Self {
        Self { reporters }
    }

    pub fn push(&mut self, reporter: Box<dyn Reporter>) {
        self.reporters.push(reporter);
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl Reporter for MultiReporter {
    fn report(&self, report: &Report) {
        for r in &self.reporters {
            r.report(report);
        }
    }
}

/// Format a duration with consistent units: ns, us, ms, or s.
fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs >= 1.0 {
        format!("{:.2}s", secs)
    } else if secs >= 0.001 {
        format!("{:.2}ms", secs * 1_000.0)
    } else if secs >= 0.000_001 {
        format!("{:.2}us", secs * 1_000_000.0)
    } else {
        format!("{:.2}ns", secs * 1_000_000_000.0)
    }
}
