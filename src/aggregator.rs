//! Per-site accumulation of call counts and durations.

use crate::config::{ProfileMode, ScopeConfig};
use crate::recorder::ScopedRecorder;
use crate::report::{Report, Reporter, SiteStats, TextReporter};
use crate::site::SiteId;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, OnceLock};

/// Accumulated measurement for one site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SiteRecord {
    /// Completed scope executions.
    pub count: u64,
    /// Sum of elapsed microseconds over all completed executions.
    pub total_micros: u64,
}

/// Outcome of [`Aggregator::dump_report`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpStatus {
    /// The report was written with this many sites.
    Written { sites: usize },
    /// Nothing recorded yet; the destination was not touched.
    Empty,
    /// The destination could not be written. A warning went to stderr and the
    /// recorded data is still available.
    Failed,
}

/// Thread-safe accumulator keyed by [`SiteId`].
///
/// Counts and durations for a site are updated together inside one critical
/// section, so a report never observes one without the other.
///
/// # Example
///
/// ```rust
/// use cntryl_scope::{Aggregator, ProfileMode, SiteId};
///
/// let aggregator = Aggregator::with_mode(ProfileMode::Timing);
/// aggregator.record_measurement(&SiteId::new("src/io.rs", 3, "read"), 120);
/// aggregator.record_measurement(&SiteId::new("src/io.rs", 3, "read"), 80);
///
/// let report = aggregator.report();
/// assert_eq!(report.entries()[0].count, 2);
/// assert_eq!(report.entries()[0].total_micros, 200);
/// ```
#[derive(Debug)]
pub struct Aggregator {
    mode: ProfileMode,
    records: Mutex<HashMap<SiteId, SiteRecord>>,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl Aggregator {
    /// Create an aggregator in the mode selected by this build's features.
    pub fn new() -> Self {
        Self::with_mode(ProfileMode::from_build())
    }

    /// Create an aggregator in an explicit mode.
    pub fn with_mode(mode: ProfileMode) -> Self {
        Self {
            mode,
            records: Mutex::new(HashMap::new()),
        }
    }

    pub fn mode(&self) -> ProfileMode {
        self.mode
    }

    // Counter updates cannot leave the map half-written, so a poisoned lock
    // still guards consistent data.
    fn lock(&self) -> MutexGuard<'_, HashMap<SiteId, SiteRecord>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn update(&self, site: &SiteId, apply: impl FnOnce(&mut SiteRecord)) {
        let mut records = self.lock();
        if let Some(record) = records.get_mut(site) {
            apply(record);
            return;
        }
        let mut record = SiteRecord::default();
        apply(&mut record);
        records.insert(site.clone(), record);
    }

    /// Add one completed execution of `site` that took `elapsed_micros`.
    ///
    /// A coverage aggregator keeps the count and discards the duration.
    pub fn record_measurement(&self, site: &SiteId, elapsed_micros: u64) {
        if self.mode == ProfileMode::Coverage {
            self.record_call(site);
            return;
        }
        self.update(site, |record| {
            record.count = record.count.saturating_add(1);
            record.total_micros = record.total_micros.saturating_add(elapsed_micros);
        });
    }

    /// Add one execution of `site` without timing it.
    pub fn record_call(&self, site: &SiteId) {
        self.update(site, |record| record.count = record.count.saturating_add(1));
    }

    /// Start timing one execution of `site`. The measurement lands when the
    /// returned recorder is dropped.
    pub fn record(&self, site: SiteId) -> ScopedRecorder<'_> {
        ScopedRecorder::new(site, self)
    }

    /// Current record for `site`, if it has executed at least once.
    pub fn get(&self, site: &SiteId) -> Option<SiteRecord> {
        self.lock().get(site).copied()
    }

    /// Number of distinct sites recorded.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Sorted snapshot of every recorded site.
    ///
    /// Ordered by descending total duration, then descending call count, then
    /// site identifier.
    pub fn report(&self) -> Report {
        let mut entries: Vec<SiteStats> = {
            let records = self.lock();
            records
                .iter()
                .map(|(site, record)| SiteStats {
                    site: site.clone(),
                    count: record.count,
                    total_micros: record.total_micros,
                })
                .collect()
        };
        entries.sort_by(|a, b| {
            b.total_micros
                .cmp(&a.total_micros)
                .then_with(|| b.count.cmp(&a.count))
                .then_with(|| a.site.cmp(&b.site))
        });
        Report::new(self.mode, entries)
    }

    /// Write the text report to `path`, replacing any previous content.
    ///
    /// An empty aggregator leaves `path` alone. Failures are logged to stderr
    /// and never disturb the recorded data.
    pub fn dump_report(&self, path: impl AsRef<Path>) -> DumpStatus {
        let report = self.report();
        if report.is_empty() {
            return DumpStatus::Empty;
        }
        let reporter = TextReporter::new(path.as_ref());
        match reporter.write_report(&report) {
            Ok(()) => DumpStatus::Written {
                sites: report.len(),
            },
            Err(e) => {
                eprintln!("Warning: failed to write report: {:#}", e);
                DumpStatus::Failed
            }
        }
    }

    /// Send a snapshot to every reporter `config` enables.
    pub fn publish(&self, config: &ScopeConfig) {
        let report = self.report();
        config.build_reporter().report(&report);
    }
}

static GLOBAL: OnceLock<Aggregator> = OnceLock::new();

/// The process-wide aggregator used by [`scope!`](crate::scope).
///
/// Created on first use with [`Aggregator::new`] unless [`install`] ran first.
pub fn global() -> &'static Aggregator {
    GLOBAL.get_or_init(Aggregator::new)
}

/// Make `aggregator` the process-wide instance.
///
/// Call once at startup, before any marker runs. Returns the aggregator back
/// if the process-wide instance already exists.
pub fn install(aggregator: Aggregator) -> Result<&'static Aggregator, Aggregator> {
    GLOBAL.set(aggregator)?;
    Ok(global())
}
