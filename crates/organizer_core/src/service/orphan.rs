//! Orphaned child detection and removal.
//!
//! # Responsibility
//! - Find items whose `group_id` does not resolve to a group in the same bucket.
//! - Remove them, plus children of groups that are about to be deleted.
//!
//! # Invariants
//! - Sweeping is idempotent: a second sweep with no changes removes nothing.
//! - Groups and top-level items are never removed by a sweep.

use crate::model::bucket::Bucket;
use crate::model::task::{Task, TaskId};
use crate::service::error::OrganizerError;
use std::collections::HashSet;

/// Result of one sweep over a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Surviving tasks in their original order.
    pub kept: Vec<Task>,
    /// Ids of removed items.
    pub removed: Vec<TaskId>,
}

impl SweepOutcome {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    /// Self-healing warning describing this sweep, if anything was removed.
    pub fn warning(&self, bucket: Bucket) -> Option<OrganizerError> {
        if self.removed.is_empty() {
            return None;
        }
        Some(OrganizerError::OrphanDetected {
            bucket,
            removed: self.removed.len(),
        })
    }
}

/// Removes orphaned items from `tasks`.
///
/// Items whose group is listed in `doomed_groups` are treated as orphans too;
/// the doomed groups themselves are kept for the caller to delete.
pub fn sweep(tasks: Vec<Task>, doomed_groups: &HashSet<TaskId>) -> SweepOutcome {
    let live_groups = live_group_ids(&tasks, doomed_groups);
    let mut kept = Vec::with_capacity(tasks.len());
    let mut removed = Vec::new();
    for task in tasks {
        if is_orphan(&task, &live_groups) {
            removed.push(task.id().clone());
        } else {
            kept.push(task);
        }
    }
    SweepOutcome { kept, removed }
}

/// Ids of orphaned items without modifying `tasks`.
pub fn find_orphans(tasks: &[Task]) -> Vec<TaskId> {
    let live_groups = live_group_ids(tasks, &HashSet::new());
    tasks
        .iter()
        .filter(|task| is_orphan(task, &live_groups))
        .map(|task| task.id().clone())
        .collect()
}

/// View of `tasks` that excludes orphans; used for counts and exports.
pub fn live_tasks(tasks: &[Task]) -> Vec<&Task> {
    let live_groups = live_group_ids(tasks, &HashSet::new());
    tasks
        .iter()
        .filter(|task| !is_orphan(task, &live_groups))
        .collect()
}

fn live_group_ids(tasks: &[Task], doomed_groups: &HashSet<TaskId>) -> HashSet<TaskId> {
    tasks
        .iter()
        .filter(|task| task.is_group() && !doomed_groups.contains(task.id()))
        .map(|task| task.id().clone())
        .collect()
}

fn is_orphan(task: &Task, live_groups: &HashSet<TaskId>) -> bool {
    match task.group_id() {
        Some(group_id) => !live_groups.contains(group_id),
        None => false,
    }
}
