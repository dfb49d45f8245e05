//! Core logic for the task organizer.
//! This crate is the single source of truth for bucket, group and quota rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod service;

pub use config::{ConfigError, LoggingConfig, OrganizerConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogSink};
pub use model::bucket::{Bucket, BucketSet};
pub use model::priority::{parse_priority, PriorityKey};
pub use model::task::{Task, TaskId, TaskKind, TaskValidationError};
pub use model::tier::{Capacity, Tier, TierSource};
pub use notify::{LogNotifier, Notifier, RecordingNotifier, Severity};
pub use repo::{
    BucketRepository, MemoryBucketRepository, OrganizerSnapshot, RepoError, RepoResult,
    SqliteBucketRepository, TaskRecord,
};
pub use service::error::{OrganizerError, OrganizerResult};
pub use service::flush::WriteTarget;
pub use service::invariants::InvariantViolation;
pub use service::mover::{MoveFilter, MoveOutcome};
pub use service::quota::{BucketLimits, Occupancy, QuotaEnforcer, QuotaTable};
pub use service::task_store::{BucketSummary, NewTask, NewTaskKind, TaskStore};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
