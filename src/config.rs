//! Configuration for the profiler.

use crate::aggregator::Aggregator;
use crate::report::{ConsoleReporter, JsonReporter, MultiReporter, TextReporter};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What an instrumented scope contributes to its site record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileMode {
    /// Call count and accumulated wall-clock time.
    Timing,
    /// Call count only.
    Coverage,
}

impl ProfileMode {
    /// Mode selected by the crate's Cargo features for this build.
    pub const fn from_build() -> Self {
        if cfg!(feature = "coverage") {
            ProfileMode::Coverage
        } else {
            ProfileMode::Timing
        }
    }
}

impl Default for ProfileMode {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Configuration for an aggregator and where its report goes.
#[derive(Debug, Clone)]
pub struct ScopeConfig {
    /// Measurement mode of the aggregator.
    pub mode: ProfileMode,
    /// Text report destination.
    pub report_path: Option<PathBuf>,
    /// JSON report destination.
    pub json_path: Option<PathBuf>,
    /// Print a summary table to stdout.
    pub console: bool,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            mode: ProfileMode::from_build(),
            report_path: None,
            json_path: None,
            console: false,
        }
    }
}

impl ScopeConfig {
    /// Create a new config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the measurement mode.
    pub fn mode(mut self, mode: ProfileMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the text report destination.
    pub fn report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Set the JSON report destination.
    pub fn json_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_path = Some(path.into());
        self
    }

    /// Enable or disable the console summary.
    pub fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Construct an aggregator in the configured mode.
    pub fn build_aggregator(&self) -> Aggregator {
        Aggregator::with_mode(self.mode)
    }

    /// Build the reporters this config enables.
    pub fn build_reporter(&self) -> MultiReporter {
        let mut reporters = MultiReporter::new(Vec::new());
        if let Some(path) = &self.report_path {
            reporters.push(Box::new(TextReporter::new(path.clone())));
        }
        if let Some(path) = &self.json_path {
            reporters.push(Box::new(JsonReporter::new(path.clone())));
        }
        if self.console {
            reporters.push(Box::new(ConsoleReporter::new()));
        }
        reporters
    }
}
