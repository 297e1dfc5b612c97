//! # cntryl-scope
//!
//! Lightweight scope instrumentation: how often each marked scope runs and how
//! much wall-clock time it takes, aggregated per call site.
//!
//! Drop a marker at the top of any scope. When the scope ends, however it
//! ends, one measurement is added to the record for that source location
//! (`file:line:function`). Ask for the report whenever you like, typically at
//! shutdown.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cntryl_scope::{scope, scoped};
//!
//! #[scoped]
//! fn compact() {
//!     // whole function is timed
//! }
//!
//! fn flush() {
//!     scope!();
//!     compact();
//! }
//!
//! flush();
//! cntryl_scope::global().dump_report("target/scope.txt");
//! ```
//!
//! Explicit aggregators work the same way and are handy in tests:
//!
//! ```rust
//! use cntryl_scope::{scope, Aggregator, ProfileMode};
//!
//! let aggregator = Aggregator::with_mode(ProfileMode::Timing);
//! for _ in 0..3 {
//!     scope!(in &aggregator);
//! }
//! print!("{}", aggregator.report().to_text());
//! ```
//!
//! ## Features
//!
//! - **`coverage`**: markers count calls without timing them
//! - **`disable`**: markers expand to nothing (wins over `coverage`)

mod aggregator;
mod config;
mod recorder;
mod report;
mod site;

pub use aggregator::{global, install, Aggregator, DumpStatus, SiteRecord};
pub use config::{ProfileMode, ScopeConfig};
pub use recorder::ScopedRecorder;
pub use report::{
    ConsoleReporter, JsonReporter, MultiReporter, Report, Reporter, SiteStats, TextReporter,
    COVERAGE_HEADER, TIMING_HEADER,
};
pub use site::{SiteId, SITE_DELIMITER};

pub use cntryl_scope_macros::scoped;

#[doc(hidden)]
pub mod __private {
    pub use crate::site::short_function_name;
}

/// Instrument the enclosing scope.
///
/// - `scope!()` reports to the process-wide [`global`] aggregator.
/// - `scope!(in agg)` reports to `agg: &Aggregator`.
///
/// In the default build the marker times the rest of the scope. With the
/// `coverage` feature it counts the call immediately; with `disable` it does
/// nothing.
#[cfg(not(any(feature = "coverage", feature = "disable")))]
#[macro_export]
macro_rules! scope {
    () => {
        $crate::scope!(@site $crate::global(), $crate::function_name!());
    };
    (in $aggregator:expr) => {
        $crate::scope!(@site $aggregator, $crate::function_name!());
    };
    (@named $function:expr) => {
        $crate::scope!(@site $crate::global(), $function);
    };
    (@site $aggregator:expr, $function:expr) => {
        let _cntryl_scope_recorder = $crate::ScopedRecorder::new(
            $crate::SiteId::new(::core::file!(), ::core::line!(), $function),
            $aggregator,
        );
    };
}

/// Instrument the enclosing scope.
///
/// Coverage build: each pass through the marker counts one call.
#[cfg(all(feature = "coverage", not(feature = "disable")))]
#[macro_export]
macro_rules! scope {
    () => {
        $crate::scope!(@site $crate::global(), $crate::function_name!());
    };
    (in $aggregator:expr) => {
        $crate::scope!(@site $aggregator, $crate::function_name!());
    };
    (@named $function:expr) => {
        $crate::scope!(@site $crate::global(), $function);
    };
    (@site $aggregator:expr, $function:expr) => {
        $crate::Aggregator::record_call(
            $aggregator,
            &$crate::SiteId::new(::core::file!(), ::core::line!(), $function),
        );
    };
}

/// Instrument the enclosing scope.
///
/// Disabled build: expands to nothing.
#[cfg(feature = "disable")]
#[macro_export]
macro_rules! scope {
    () => {};
    (in $aggregator:expr) => {
        let _ = &$aggregator;
    };
    (@named $function:expr) => {};
    (@site $aggregator:expr, $function:expr) => {};
}
