//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `organizer_core` linkage.
//! - Optionally load a stored snapshot and print per-bucket summaries.

use log::warn;
use organizer_core::{
    Bucket, LoggingConfig, MemoryBucketRepository, OrganizerConfig, OrganizerSnapshot, TaskStore,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("organizer_core ping={}", organizer_core::ping());
    println!("organizer_core version={}", organizer_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };
    let logging = LoggingConfig {
        level: "warn".to_string(),
        log_dir: None,
    };
    if let Err(err) = organizer_core::init_logging(&logging) {
        eprintln!("logging disabled: {err}");
    }

    match summarize(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn summarize(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let snapshot = OrganizerSnapshot::from_json_str(&raw)?;
    let store = TaskStore::from_snapshot(
        MemoryBucketRepository::new(),
        &OrganizerConfig::default(),
        &snapshot,
    );

    for bucket in Bucket::ALL {
        let summary = store.summary(bucket);
        println!(
            "{} total={} completed={} occupancy={} capacity={}",
            bucket, summary.total, summary.completed, summary.occupancy, summary.capacity
        );
    }
    for violation in store.invariant_violations() {
        warn!("event=cli_summary module=cli status=violation detail={violation}");
    }
    Ok(())
}
