//! Cross-bucket move operations.
//!
//! # Responsibility
//! - Relocate single tasks, whole groups, and filtered batches between buckets.
//! - Re-validate destination quota before any mutation.
//!
//! # Invariants
//! - Every call is all-or-nothing: on error neither bucket changes.
//! - A group always moves together with all of its children.
//! - A child moved on its own is detached from its former group.
//! - Both buckets are swept for orphans right after every move.

use crate::model::bucket::{Bucket, BucketSet};
use crate::model::task::{Task, TaskId};
use crate::model::tier::Tier;
use crate::service::completion::resync_group;
use crate::service::error::OrganizerError;
use crate::service::orphan::sweep;
use crate::service::quota::{Occupancy, QuotaEnforcer};
use log::warn;
use std::collections::HashSet;

/// Candidate selection for bulk moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveFilter {
    All,
    Completed,
    Incomplete,
}

impl MoveFilter {
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.is_completed(),
            Self::Incomplete => !task.is_completed(),
        }
    }
}

/// What a successful move changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Ids that changed bucket, in source order.
    pub moved: Vec<TaskId>,
    /// Quota cost charged against the destination.
    pub cost: Occupancy,
    /// Group a single child was detached from.
    pub detached_from: Option<TaskId>,
    /// Orphans removed by the post-move sweep; expected to be zero.
    pub orphans_removed: usize,
}

impl MoveOutcome {
    pub fn is_noop(&self) -> bool {
        self.moved.is_empty()
    }
}

/// Moves one item or one group (with its children) from `from` to `to`.
///
/// Groups are charged their own weight only; children ride along.
pub fn move_task(
    buckets: &mut BucketSet,
    quota: &QuotaEnforcer,
    id: &TaskId,
    from: Bucket,
    to: Bucket,
    tier: Tier,
) -> Result<MoveOutcome, OrganizerError> {
    let Some(task) = buckets.get(from).iter().find(|task| task.id() == id) else {
        return Err(match buckets.locate(id) {
            Some(_) => OrganizerError::NotInBucket {
                id: id.clone(),
                bucket: from,
            },
            None => OrganizerError::TaskNotFound(id.clone()),
        });
    };
    if from == to {
        return Ok(MoveOutcome::default());
    }

    let is_group = task.is_group();
    let former_parent = task.group_id().cloned();
    let cost = Occupancy::for_shape(is_group);
    quota.ensure_fits(to, buckets.get(to), cost, tier)?;

    let mut ids = HashSet::from([id.clone()]);
    if is_group {
        ids.extend(
            buckets
                .get(from)
                .iter()
                .filter(|task| task.is_child_of(id))
                .map(|task| task.id().clone()),
        );
    }

    let moved = relocate(buckets, &ids, from, to, !is_group);
    if let Some(parent) = &former_parent {
        resync_group(buckets.get_mut(from), parent);
    }
    let orphans_removed = revalidate(buckets, &[from, to]);

    Ok(MoveOutcome {
        moved,
        cost,
        detached_from: former_parent,
        orphans_removed,
    })
}

/// Moves every top-level task matching `filter` (groups with all children).
///
/// The combined weight of the batch, children included, must fit the
/// destination or nothing moves.
pub fn move_all(
    buckets: &mut BucketSet,
    quota: &QuotaEnforcer,
    from: Bucket,
    to: Bucket,
    filter: MoveFilter,
    tier: Tier,
) -> Result<MoveOutcome, OrganizerError> {
    if from == to {
        return Ok(MoveOutcome::default());
    }

    let source = buckets.get(from);
    let selected_groups = source
        .iter()
        .filter(|task| task.is_group() && filter.matches(task))
        .map(Task::id)
        .collect::<HashSet<_>>();
    let ids = source
        .iter()
        .filter(|task| match task.group_id() {
            Some(group_id) => selected_groups.contains(group_id),
            None => filter.matches(task),
        })
        .map(|task| task.id().clone())
        .collect::<HashSet<_>>();
    if ids.is_empty() {
        return Ok(MoveOutcome::default());
    }

    let cost = Occupancy::of_tasks(source.iter().filter(|task| ids.contains(task.id())));
    quota.ensure_fits(to, buckets.get(to), cost, tier)?;

    let moved = relocate(buckets, &ids, from, to, false);
    let orphans_removed = revalidate(buckets, &[from, to]);

    Ok(MoveOutcome {
        moved,
        cost,
        detached_from: None,
        orphans_removed,
    })
}

fn relocate(
    buckets: &mut BucketSet,
    ids: &HashSet<TaskId>,
    from: Bucket,
    to: Bucket,
    detach: bool,
) -> Vec<TaskId> {
    let source = std::mem::take(buckets.get_mut(from));
    let (mut moving, staying): (Vec<Task>, Vec<Task>) = source
        .into_iter()
        .partition(|task| ids.contains(task.id()));
    buckets.replace(from, staying);

    for task in &mut moving {
        task.set_bucket(to);
        if detach {
            task.detach();
        }
    }
    let moved = moving.iter().map(|task| task.id().clone()).collect();
    buckets.get_mut(to).extend(moving);
    moved
}

fn revalidate(buckets: &mut BucketSet, touched: &[Bucket]) -> usize {
    let mut removed = 0;
    for bucket in touched {
        let outcome = sweep(std::mem::take(buckets.get_mut(*bucket)), &HashSet::new());
        if let Some(warning) = outcome.warning(*bucket) {
            warn!(
                "event=orphan_sweep module=mover status=healed bucket={} removed={} detail={}",
                bucket,
                outcome.removed_count(),
                warning
            );
        }
        removed += outcome.removed_count();
        buckets.replace(*bucket, outcome.kept);
    }
    removed
}
