//! Instruments a toy workload across threads and writes the report.
//!
//! ```text
//! cargo run --manifest-path demo/Cargo.toml -- target/scope.txt
//! ```

use anyhow::{bail, Result};
use cntryl_scope::{install, scope, scoped, ScopeConfig};
use std::hint::black_box;
use std::path::PathBuf;

#[scoped]
fn fibonacci(n: u32) -> u64 {
    match n {
        0 => 0,
        1 => 1,
        _ => fib_inner(n - 1) + fib_inner(n - 2),
    }
}

fn fib_inner(n: u32) -> u64 {
    if n < 2 {
        return n as u64;
    }
    fib_inner(n - 1) + fib_inner(n - 2)
}

#[scoped(name = "allocate_buffer")]
fn allocate(size: usize) -> Vec<u8> {
    let mut buffer = vec![0u8; size];
    if let Some(first) = buffer.first_mut() {
        *first = 1;
    }
    if let Some(last) = buffer.last_mut() {
        *last = 1;
    }
    buffer
}

fn parse_all(inputs: &[&str]) -> Result<Vec<u32>> {
    scope!();
    let mut parsed = Vec::with_capacity(inputs.len());
    for input in inputs {
        parsed.push(input.parse()?);
    }
    Ok(parsed)
}

fn main() -> Result<()> {
    let report_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/scope.txt"));

    let config = ScopeConfig::new()
        .report_path(&report_path)
        .console(true);
    let Ok(aggregator) = install(config.build_aggregator()) else {
        bail!("process-wide aggregator was already initialised");
    };

    let workers: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                for _ in 0..10 {
                    black_box(fibonacci(18 + i));
                    black_box(allocate(1024 * 1024));
                }
            })
        })
        .collect();
    for w in workers {
        if w.join().is_err() {
            bail!("worker thread panicked");
        }
    }

    black_box(parse_all(&["1", "2", "3"])?);
    // Fails on the second input; the scope is still recorded
    let _ = parse_all(&["4", "x"]);

    aggregator.publish(&config);
    Ok(())
}
