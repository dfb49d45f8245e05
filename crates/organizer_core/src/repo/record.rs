//! Persisted JSON record shapes.
//!
//! # Responsibility
//! - Mirror the app's stored layout: `todos`, `tomorrowTodos`, `laterTodos`,
//!   `expandedGroups`, plus opaque `notes`/`noteFolders`.
//! - Convert between wire records and validated `Task` values.
//!
//! # Invariants
//! - `groupId` is never written for groups; `isGroup` is only written when true.
//! - Reading a record never trusts `tab` over the record set it was stored in.
//! - Ids are opaque: any non-blank id loads verbatim, a blank `groupId` means
//!   no parent.

use crate::model::bucket::Bucket;
use crate::model::task::{Task, TaskId, TaskKind};
use crate::repo::RepoError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One stored task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_group: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab: Option<Bucket>,
}

impl From<&Task> for TaskRecord {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id().to_string(),
            title: task.title().to_string(),
            completed: task.is_completed(),
            created_at: task.created_at(),
            group_id: task.group_id().map(|id| id.to_string()),
            is_group: task.is_group().then_some(true),
            tab: Some(task.bucket()),
        }
    }
}

impl TaskRecord {
    /// Converts this record into a task stored in `bucket`.
    ///
    /// A stray `groupId` on a group record is dropped.
    pub fn to_task(&self, bucket: Bucket) -> Result<Task, RepoError> {
        let id = TaskId::parse(&self.id)
            .ok_or_else(|| RepoError::InvalidData("task record with blank id".to_string()))?;
        let kind = if self.is_group.unwrap_or(false) {
            TaskKind::Group
        } else {
            TaskKind::Item {
                group_id: self.group_id.as_deref().and_then(TaskId::parse),
            }
        };
        Task::from_parts(
            id,
            &self.title,
            self.completed,
            self.created_at,
            bucket,
            kind,
        )
        .map_err(|err| RepoError::InvalidData(format!("task record {}: {err}", self.id)))
    }
}

/// Full persisted organizer state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizerSnapshot {
    #[serde(default)]
    pub todos: Vec<TaskRecord>,
    #[serde(default)]
    pub tomorrow_todos: Vec<TaskRecord>,
    #[serde(default)]
    pub later_todos: Vec<TaskRecord>,
    /// Group id → expanded flag; pure UI state.
    #[serde(default)]
    pub expanded_groups: BTreeMap<String, bool>,
    /// Carried through unchanged.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<serde_json::Value>,
    /// Carried through unchanged.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note_folders: Vec<serde_json::Value>,
}

impl OrganizerSnapshot {
    pub fn records(&self, bucket: Bucket) -> &[TaskRecord] {
        match bucket {
            Bucket::Today => &self.todos,
            Bucket::Tomorrow => &self.tomorrow_todos,
            Bucket::Later => &self.later_todos,
        }
    }

    pub fn records_mut(&mut self, bucket: Bucket) -> &mut Vec<TaskRecord> {
        match bucket {
            Bucket::Today => &mut self.todos,
            Bucket::Tomorrow => &mut self.tomorrow_todos,
            Bucket::Later => &mut self.later_todos,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RepoError> {
        serde_json::from_str(raw).map_err(RepoError::Serialization)
    }

    pub fn to_json_string(&self) -> Result<String, RepoError> {
        serde_json::to_string_pretty(self).map_err(RepoError::Serialization)
    }
}
