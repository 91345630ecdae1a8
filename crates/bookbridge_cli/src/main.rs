//! CLI runner for the three demonstration strategies.
//!
//! # Responsibility
//! - Drive `run_demonstrations` against in-memory stores.
//! - Keep output deterministic for quick local sanity checks.

use bookbridge_core::{default_log_level, init_logging, run_demonstrations, WorkflowReport};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let log_dir = std::env::temp_dir().join("bookbridge-logs");
    if let Err(err) = init_logging(default_log_level(), &log_dir.to_string_lossy()) {
        // The demonstrations still run; only diagnostics are lost.
        eprintln!("logging disabled: {err}");
    }

    println!("bookbridge_core version={}", bookbridge_core::core_version());

    match run_demonstrations().await {
        Ok(outcomes) => {
            for outcome in outcomes {
                println!("== {} ==", outcome.strategy.as_str());
                print_report("well_formed", &outcome.well_formed);
                print_report("malformed", &outcome.malformed);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("demonstrations failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn print_report(label: &str, report: &WorkflowReport) {
    println!(
        "[{label}] inserted_id={:?} records={} cleanup_done={}",
        report.inserted_id,
        report.records.as_ref().map_or(0, Vec::len),
        report.cleanup_done()
    );
    for error in &report.store_errors {
        println!("[{label}] store error: {error}");
    }
}
