//! Scope-bound timing guard.

use crate::aggregator::Aggregator;
use crate::site::SiteId;
use std::marker::PhantomData;
use std::time::{Duration, Instant};

/// Times one execution of a scope and reports it when dropped.
///
/// The drop runs on every exit path: fall-through, early `return`, `?`, and
/// panic unwind. Each recorder reports exactly once. It cannot be cloned and
/// stays on the thread that created it.
///
/// # Example
///
/// ```rust
/// use cntryl_scope::{Aggregator, ProfileMode, ScopedRecorder, SiteId};
///
/// let aggregator = Aggregator::with_mode(ProfileMode::Timing);
/// let site = SiteId::new("src/main.rs", 10, "load");
/// {
///     let _recorder = ScopedRecorder::new(site.clone(), &aggregator);
///     // timed work
/// }
/// assert_eq!(aggregator.get(&site).unwrap().count, 1);
/// ```
#[must_use = "the scope is timed until the recorder is dropped"]
pub struct ScopedRecorder<'a> {
    site: SiteId,
    start: Instant,
    aggregator: &'a Aggregator,
    // !Send + !Sync
    _not_send: PhantomData<*const ()>,
}

impl<'a> ScopedRecorder<'a> {
    /// Start timing `site`. Nothing is recorded until drop.
    #[inline]
    pub fn new(site: SiteId, aggregator: &'a Aggregator) -> Self {
        Self {
            site,
            start: Instant::now(),
            aggregator,
            _not_send: PhantomData,
        }
    }

    pub fn site(&self) -> &SiteId {
        &self.site
    }

    /// Time spent in the scope so far.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedRecorder<'_> {
    fn drop(&mut self) {
        let micros = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);
        self.aggregator.record_measurement(&self.site, micros);
    }
}
