//! End-to-end behaviour of the `scope!` marker and `#[scoped]` attribute in
//! the default timing build.
#![cfg(not(any(feature = "coverage", feature = "disable")))]

use cntryl_scope::{scope, scoped, Aggregator, DumpStatus, ProfileMode, SiteStats};
use std::sync::Arc;
use std::time::Duration;

fn entries_for<'a>(entries: &'a [SiteStats], function: &str) -> Vec<&'a SiteStats> {
    let suffix = format!(":{}", function);
    entries
        .iter()
        .filter(|e| e.site.as_str().ends_with(&suffix))
        .collect()
}

fn instrumented(aggregator: &Aggregator) {
    scope!(in aggregator);
    std::thread::sleep(Duration::from_millis(1));
}

#[test]
fn should_count_every_execution_of_a_site() {
    let aggregator = Aggregator::with_mode(ProfileMode::Timing);
    for _ in 0..5 {
        instrumented(&aggregator);
    }

    let report = aggregator.report();
    assert_eq!(report.len(), 1);
    let entry = &report.entries()[0];
    assert_eq!(entry.count, 5);
    assert!(entry.total_micros >= 5_000);
    assert!(entry.site.as_str().starts_with("tests/markers.rs:"));
    assert!(entry.site.as_str().ends_with(":instrumented"));
}

#[test]
fn should_key_distinct_markers_by_line() {
    let aggregator = Aggregator::with_mode(ProfileMode::Timing);
    {
        scope!(in &aggregator);
    }
    {
        scope!(in &aggregator);
    }

    let report = aggregator.report();
    assert_eq!(report.len(), 2);
    assert!(report.entries().iter().all(|e| e.count == 1));
}

#[test]
fn should_time_until_end_of_enclosing_block() {
    let aggregator = Aggregator::with_mode(ProfileMode::Timing);
    {
        scope!(in &aggregator);
        std::thread::sleep(Duration::from_millis(5));
        assert!(aggregator.is_empty());
    }
    assert_eq!(aggregator.report().entries()[0].count, 1);
}

#[test]
fn should_record_once_when_scope_panics() {
    fn explode(aggregator: &Aggregator) {
        scope!(in aggregator);
        panic!("boom");
    }

    let aggregator = Aggregator::with_mode(ProfileMode::Timing);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| explode(&aggregator)));
    assert!(result.is_err());

    let report = aggregator.report();
    assert_eq!(entries_for(report.entries(), "explode")[0].count, 1);
}

#[test]
fn should_not_lose_counts_across_threads() {
    const THREADS: usize = 8;
    const ITERATIONS: usize = 500;

    fn hot_path(aggregator: &Aggregator) {
        scope!(in aggregator);
        std::hint::black_box(1 + 1);
    }

    for _ in 0..3 {
        let aggregator = Arc::new(Aggregator::with_mode(ProfileMode::Timing));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let aggregator = Arc::clone(&aggregator);
                std::thread::spawn(move || {
                    for _ in 0..ITERATIONS {
                        hot_path(&aggregator);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        let report = aggregator.report();
        assert_eq!(report.len(), 1);
        assert_eq!(report.entries()[0].count, (THREADS * ITERATIONS) as u64);
    }
}

#[scoped]
fn attribute_instrumented(n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    n * 2
}

#[scoped(name = "renamed_site")]
fn attribute_renamed() {}

#[test]
fn should_instrument_functions_with_attribute() {
    attribute_instrumented(0);
    attribute_instrumented(3);
    attribute_renamed();

    let report = cntryl_scope::global().report();
    let plain = entries_for(report.entries(), "attribute_instrumented");
    assert_eq!(plain.len(), 1);
    assert_eq!(plain[0].count, 2);
    assert_eq!(entries_for(report.entries(), "renamed_site")[0].count, 1);
}

fn global_site() {
    scope!();
}

#[test]
fn should_report_to_global_aggregator_by_default() {
    for _ in 0..4 {
        global_site();
    }
    let report = cntryl_scope::global().report();
    assert_eq!(entries_for(report.entries(), "global_site")[0].count, 4);
}

#[test]
fn should_write_report_file_in_text_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scope.txt");
    let aggregator = Aggregator::with_mode(ProfileMode::Timing);
    instrumented(&aggregator);
    instrumented(&aggregator);

    assert_eq!(aggregator.dump_report(&path), DumpStatus::Written { sites: 1 });

    let text = std::fs::read_to_string(&path).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("===== Time Spent (us) ====="));
    let line = lines.next().unwrap();
    assert!(line.starts_with("tests/markers.rs:"));
    assert!(line.contains(":instrumented: "));
    assert!(line.ends_with(" us, 2 calls"));
    assert_eq!(lines.next(), None);
}

#[test]
fn should_leave_existing_file_untouched_when_nothing_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scope.txt");
    std::fs::write(&path, "previous run\n").unwrap();

    let aggregator = Aggregator::with_mode(ProfileMode::Timing);
    assert_eq!(aggregator.dump_report(&path), DumpStatus::Empty);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous run\n");
}
