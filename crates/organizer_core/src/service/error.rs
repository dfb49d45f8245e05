//! Organizer operation errors.
//!
//! # Invariants
//! - Every error is recoverable: a rejected operation leaves state unchanged.
//! - `OrphanDetected` and `PersistenceFailure` never undo an accepted mutation.

use crate::model::bucket::Bucket;
use crate::model::task::{TaskId, TaskValidationError};
use crate::repo::RepoError;
use crate::service::quota::Occupancy;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type OrganizerResult<T> = Result<T, OrganizerError>;

/// Errors from task organizer operations.
#[derive(Debug)]
pub enum OrganizerError {
    /// Add/edit title is blank after trim.
    EmptyTitle,
    /// Task identity or shape is invalid.
    InvalidTask(TaskValidationError),
    /// Add or move-in would exceed the destination capacity.
    QuotaExceeded {
        bucket: Bucket,
        limit: u32,
        occupancy: Occupancy,
        requested: Occupancy,
    },
    /// Orphaned children were found and removed.
    OrphanDetected { bucket: Bucket, removed: usize },
    /// Durable read or write failed.
    PersistenceFailure(RepoError),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Target task exists but not in the stated bucket.
    NotInBucket { id: TaskId, bucket: Bucket },
    /// Parent group does not exist in the target bucket.
    GroupNotFound(TaskId),
    /// Target task exists but is not a group.
    NotAGroup(TaskId),
    /// Target task exists but is a group where an item was expected.
    NotAnItem(TaskId),
    /// Imported task id is already in use.
    DuplicateId(TaskId),
}

impl Display for OrganizerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::InvalidTask(err) => write!(f, "{err}"),
            Self::QuotaExceeded {
                bucket,
                limit,
                occupancy,
                requested,
            } => write!(
                f,
                "{} is full: limit {limit}, occupied {occupancy}, requested {requested}",
                bucket.label()
            ),
            Self::OrphanDetected { bucket, removed } => {
                write!(f, "removed {removed} orphaned task(s) from {bucket}")
            }
            Self::PersistenceFailure(err) => write!(f, "persistence failure: {err}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::NotInBucket { id, bucket } => write!(f, "task {id} is not in {bucket}"),
            Self::GroupNotFound(id) => write!(f, "group not found: {id}"),
            Self::NotAGroup(id) => write!(f, "task is not a group: {id}"),
            Self::NotAnItem(id) => write!(f, "task is a group, not an item: {id}"),
            Self::DuplicateId(id) => write!(f, "duplicate task id: {id}"),
        }
    }
}

impl Error for OrganizerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTask(err) => Some(err),
            Self::PersistenceFailure(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TaskValidationError> for OrganizerError {
    fn from(value: TaskValidationError) -> Self {
        match value {
            TaskValidationError::EmptyTitle => Self::EmptyTitle,
            other => Self::InvalidTask(other),
        }
    }
}

impl From<RepoError> for OrganizerError {
    fn from(value: RepoError) -> Self {
        Self::PersistenceFailure(value)
    }
}
