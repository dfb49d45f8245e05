//! Display ordering for bucket contents.
//!
//! # Invariants
//! - Ordering is a pure function of the task set; input order never matters.
//! - Sort order is never persisted; it is recomputed per query.

use crate::model::task::Task;
use std::cmp::Ordering;

/// Total order used for rendering one bucket.
///
/// Precedence: priority keys (padded lexicographic), prioritized before
/// unprioritized, groups before items, `created_at` ascending, then `id`.
pub fn compare_tasks(left: &Task, right: &Task) -> Ordering {
    let by_priority = match (left.priority(), right.priority()) {
        (Some(left_key), Some(right_key)) => left_key.compare(&right_key),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => right.is_group().cmp(&left.is_group()),
    };
    by_priority
        .then_with(|| left.created_at().cmp(&right.created_at()))
        .then_with(|| left.id().cmp(right.id()))
}

/// Sorts `tasks` in place.
pub fn sort_tasks(tasks: &mut [Task]) {
    tasks.sort_by(compare_tasks);
}

/// Returns a sorted copy of `tasks`.
pub fn sorted<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Vec<Task> {
    let mut out = tasks.into_iter().cloned().collect::<Vec<_>>();
    sort_tasks(&mut out);
    out
}
