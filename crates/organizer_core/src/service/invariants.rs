//! Whole-collection invariant audit.

use crate::model::bucket::{Bucket, BucketSet};
use crate::model::task::{Task, TaskId};
use crate::service::completion::group_is_consistent;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// One broken organizer invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Item points at a group that is missing from its bucket.
    DanglingGroupRef { id: TaskId, group_id: TaskId },
    /// Group flag disagrees with its children.
    GroupOutOfSync { group_id: TaskId },
    /// Same id appears more than once.
    DuplicateId { id: TaskId },
    /// Task's own bucket tag differs from the bucket holding it.
    BucketMismatch { id: TaskId, stored_in: Bucket },
}

impl Display for InvariantViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingGroupRef { id, group_id } => {
                write!(f, "task {id} references missing group {group_id}")
            }
            Self::GroupOutOfSync { group_id } => {
                write!(f, "group {group_id} completion disagrees with its children")
            }
            Self::DuplicateId { id } => write!(f, "duplicate task id {id}"),
            Self::BucketMismatch { id, stored_in } => {
                write!(f, "task {id} is stored in {stored_in} but tagged otherwise")
            }
        }
    }
}

/// Lists every invariant violation in `buckets`; empty means healthy.
pub fn audit(buckets: &BucketSet) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let mut seen = HashSet::new();

    for (bucket, tasks) in buckets.iter() {
        let groups = tasks
            .iter()
            .filter(|task| task.is_group())
            .map(Task::id)
            .collect::<HashSet<_>>();

        for task in tasks {
            if !seen.insert(task.id()) {
                violations.push(InvariantViolation::DuplicateId {
                    id: task.id().clone(),
                });
            }
            if task.bucket() != bucket {
                violations.push(InvariantViolation::BucketMismatch {
                    id: task.id().clone(),
                    stored_in: bucket,
                });
            }
            if let Some(group_id) = task.group_id() {
                if !groups.contains(group_id) {
                    violations.push(InvariantViolation::DanglingGroupRef {
                        id: task.id().clone(),
                        group_id: group_id.clone(),
                    });
                }
            }
            if task.is_group() && !group_is_consistent(tasks, task) {
                violations.push(InvariantViolation::GroupOutOfSync {
                    group_id: task.id().clone(),
                });
            }
        }
    }
    violations
}
