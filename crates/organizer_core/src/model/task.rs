//! Task domain model.
//!
//! # Responsibility
//! - Define the leaf/container union every organizer operation works on.
//! - Validate titles and identity at construction time.
//!
//! # Invariants
//! - `id` is an opaque, non-blank string; stored ids are kept verbatim.
//! - `title` is trimmed and non-empty.
//! - Only `TaskKind::Item` can reference a parent group.
//! - `created_at` never changes after construction.

use crate::model::bucket::Bucket;
use crate::model::priority::{parse_priority, PriorityKey};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable, opaque identifier for every task.
///
/// New tasks get a UUID v4 string; ids read from storage are accepted as-is
/// (after trimming) so records written by older builds keep their identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps a stored id; `None` when it is blank.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Leaf or container shape of a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Leaf task, optionally attached to a group in the same bucket.
    Item { group_id: Option<TaskId> },
    /// Container aggregating zero or more child items.
    Group,
}

/// Validation errors for task construction and edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    EmptyTitle,
    EmptyId,
    SelfParent(TaskId),
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "task title must not be blank"),
            Self::EmptyId => write!(f, "task id must not be blank"),
            Self::SelfParent(id) => write!(f, "task {id} cannot be its own group"),
        }
    }
}

impl Error for TaskValidationError {}

/// One organizer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: String,
    completed: bool,
    created_at: i64,
    bucket: Bucket,
    kind: TaskKind,
}

impl Task {
    /// Creates a standalone item with a generated id.
    pub fn item(
        title: &str,
        bucket: Bucket,
        created_at: i64,
    ) -> Result<Self, TaskValidationError> {
        Self::from_parts(
            TaskId::generate(),
            title,
            false,
            created_at,
            bucket,
            TaskKind::Item { group_id: None },
        )
    }

    /// Creates an empty group with a generated id.
    pub fn group(
        title: &str,
        bucket: Bucket,
        created_at: i64,
    ) -> Result<Self, TaskValidationError> {
        Self::from_parts(
            TaskId::generate(),
            title,
            false,
            created_at,
            bucket,
            TaskKind::Group,
        )
    }

    /// Creates a child item attached to `group_id`.
    ///
    /// The caller is responsible for checking that the group exists in `bucket`.
    pub fn subtask(
        title: &str,
        bucket: Bucket,
        group_id: TaskId,
        created_at: i64,
    ) -> Result<Self, TaskValidationError> {
        Self::from_parts(
            TaskId::generate(),
            title,
            false,
            created_at,
            bucket,
            TaskKind::Item {
                group_id: Some(group_id),
            },
        )
    }

    /// Rebuilds a task from explicit parts.
    ///
    /// Used by import/load paths where identity already exists externally.
    pub fn from_parts(
        id: TaskId,
        title: &str,
        completed: bool,
        created_at: i64,
        bucket: Bucket,
        kind: TaskKind,
    ) -> Result<Self, TaskValidationError> {
        if id.as_str().trim().is_empty() {
            return Err(TaskValidationError::EmptyId);
        }
        if let TaskKind::Item {
            group_id: Some(group_id),
        } = &kind
        {
            if *group_id == id {
                return Err(TaskValidationError::SelfParent(id));
            }
        }
        Ok(Self {
            id,
            title: normalize_title(title)?,
            completed,
            created_at,
            bucket,
            kind,
        })
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Unix epoch milliseconds.
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, TaskKind::Group)
    }

    /// Parent group reference; always `None` for groups.
    pub fn group_id(&self) -> Option<&TaskId> {
        match &self.kind {
            TaskKind::Item { group_id } => group_id.as_ref(),
            TaskKind::Group => None,
        }
    }

    /// Returns whether this task is a direct child of `group_id`.
    pub fn is_child_of(&self, group_id: &TaskId) -> bool {
        self.group_id() == Some(group_id)
    }

    /// Priority key parsed from the title prefix, if any.
    pub fn priority(&self) -> Option<PriorityKey> {
        parse_priority(&self.title)
    }

    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }

    pub(crate) fn set_title(&mut self, title: &str) -> Result<(), TaskValidationError> {
        self.title = normalize_title(title)?;
        Ok(())
    }

    pub(crate) fn set_bucket(&mut self, bucket: Bucket) {
        self.bucket = bucket;
    }

    /// Clears the parent reference of an item. No-op for groups.
    pub(crate) fn detach(&mut self) {
        if let TaskKind::Item { group_id } = &mut self.kind {
            *group_id = None;
        }
    }
}

/// Trims `value` and rejects blank titles.
pub fn normalize_title(value: &str) -> Result<String, TaskValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TaskValidationError::EmptyTitle);
    }
    Ok(trimmed.to_string())
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
