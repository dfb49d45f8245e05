//! Group/child completion consistency.
//!
//! # Responsibility
//! - Toggle groups and items while keeping a group's flag in sync with its
//!   children.
//!
//! # Invariants
//! - A group with children is completed iff every child is completed.
//! - A group with no children keeps whatever state it was last toggled to.
//! - Only the group that owns the toggled task is ever recomputed.

use crate::model::task::{Task, TaskId, TaskKind};
use crate::service::error::OrganizerError;

/// Flips a group and cascades the new value to all of its children.
///
/// Returns the group's new completion state.
pub fn toggle_group(tasks: &mut [Task], group_id: &TaskId) -> Result<bool, OrganizerError> {
    let group = tasks
        .iter_mut()
        .find(|task| task.id() == group_id)
        .ok_or_else(|| OrganizerError::TaskNotFound(group_id.clone()))?;
    if !group.is_group() {
        return Err(OrganizerError::NotAGroup(group_id.clone()));
    }
    let completed = !group.is_completed();
    group.set_completed(completed);

    for child in tasks.iter_mut().filter(|task| task.is_child_of(group_id)) {
        child.set_completed(completed);
    }
    Ok(completed)
}

/// Flips one item and recomputes its parent group, if any.
///
/// Returns the item's new completion state.
pub fn toggle_item(tasks: &mut [Task], item_id: &TaskId) -> Result<bool, OrganizerError> {
    let item = tasks
        .iter_mut()
        .find(|task| task.id() == item_id)
        .ok_or_else(|| OrganizerError::TaskNotFound(item_id.clone()))?;
    if !matches!(item.kind(), TaskKind::Item { .. }) {
        return Err(OrganizerError::NotAnItem(item_id.clone()));
    }
    let completed = !item.is_completed();
    item.set_completed(completed);

    if let Some(group_id) = item.group_id().cloned() {
        resync_group(tasks, &group_id);
    }
    Ok(completed)
}

/// Toggles any task, dispatching on its kind.
pub fn toggle(tasks: &mut [Task], id: &TaskId) -> Result<bool, OrganizerError> {
    let task = tasks
        .iter()
        .find(|task| task.id() == id)
        .ok_or_else(|| OrganizerError::TaskNotFound(id.clone()))?;
    if task.is_group() {
        toggle_group(tasks, id)
    } else {
        toggle_item(tasks, id)
    }
}

/// Recomputes a group's flag from its children after membership changes.
///
/// Returns the group's state when it was recomputed, `None` when the group is
/// missing or has no children (its state is then left untouched).
pub fn resync_group(tasks: &mut [Task], group_id: &TaskId) -> Option<bool> {
    let mut children = tasks.iter().filter(|task| task.is_child_of(group_id));
    let first = children.next()?;
    let all_done = first.is_completed() && children.all(Task::is_completed);

    let group = tasks
        .iter_mut()
        .find(|task| task.id() == group_id && task.is_group())?;
    group.set_completed(all_done);
    Some(all_done)
}

/// Returns whether the group's flag agrees with its children.
pub fn group_is_consistent(tasks: &[Task], group: &Task) -> bool {
    let mut children = tasks
        .iter()
        .filter(|task| task.is_child_of(group.id()))
        .peekable();
    if children.peek().is_none() {
        return true;
    }
    let all_done = children.all(Task::is_completed);
    group.is_completed() == all_done
}

#[cfg(test)]
mod tests {
    use super::{group_is_consistent, resync_group, toggle, toggle_group, toggle_item};
    use crate::model::bucket::Bucket;
    use crate::model::task::{Task, TaskId};
    use crate::service::error::OrganizerError;

    fn group_with_children(count: usize) -> (Vec<Task>, TaskId, Vec<TaskId>) {
        let group = Task::group("Trip", Bucket::Today, 0).unwrap();
        let group_id = group.id().clone();
        let mut tasks = vec![group];
        let mut child_ids = Vec::new();
        for index in 0..count {
            let child =
                Task::subtask(&format!("step {index}"), Bucket::Today, group_id.clone(), 1 + index as i64)
                    .unwrap();
            child_ids.push(child.id().clone());
            tasks.push(child);
        }
        (tasks, group_id, child_ids)
    }

    fn state(tasks: &[Task], id: &TaskId) -> bool {
        tasks.iter().find(|task| task.id() == id).unwrap().is_completed()
    }

    #[test]
    fn group_completes_only_when_last_child_completes() {
        let (mut tasks, group_id, children) = group_with_children(2);

        toggle_item(&mut tasks, &children[0]).unwrap();
        assert!(!state(&tasks, &group_id));

        toggle_item(&mut tasks, &children[1]).unwrap();
        assert!(state(&tasks, &group_id));

        toggle_item(&mut tasks, &children[1]).unwrap();
        assert!(!state(&tasks, &group_id));
    }

    #[test]
    fn toggling_group_syncs_every_child() {
        let (mut tasks, group_id, children) = group_with_children(3);
        toggle_item(&mut tasks, &children[1]).unwrap();

        assert!(toggle_group(&mut tasks, &group_id).unwrap());
        assert!(children.iter().all(|id| state(&tasks, id)));

        assert!(!toggle_group(&mut tasks, &group_id).unwrap());
        assert!(children.iter().all(|id| !state(&tasks, id)));
    }

    #[test]
    fn empty_group_toggles_independently() {
        let (mut tasks, group_id, _) = group_with_children(0);

        assert!(toggle(&mut tasks, &group_id).unwrap());
        assert_eq!(resync_group(&mut tasks, &group_id), None);
        assert!(state(&tasks, &group_id));
        assert!(group_is_consistent(&tasks, &tasks[0]));
    }

    #[test]
    fn toggle_group_rejects_items_and_unknown_ids() {
        let (mut tasks, _, children) = group_with_children(1);

        let err = toggle_group(&mut tasks, &children[0]).unwrap_err();
        assert!(matches!(err, OrganizerError::NotAGroup(id) if id == children[0]));

        let missing = TaskId::generate();
        let err = toggle(&mut tasks, &missing).unwrap_err();
        assert!(matches!(err, OrganizerError::TaskNotFound(id) if id == missing));
    }

    #[test]
    fn other_groups_are_untouched() {
        let (mut tasks, first_group, first_children) = group_with_children(1);
        let (other, other_group, _) = group_with_children(1);
        tasks.extend(other);

        toggle_item(&mut tasks, &first_children[0]).unwrap();
        assert!(state(&tasks, &first_group));
        assert!(!state(&tasks, &other_group));
    }
}
