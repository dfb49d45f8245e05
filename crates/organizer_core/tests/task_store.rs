use organizer_core::{
    Bucket, Capacity, MemoryBucketRepository, MoveFilter, NewTask, Occupancy, OrganizerConfig,
    OrganizerError, RecordingNotifier, Severity, TaskId, TaskStore, Tier,
};
use std::cell::Cell;
use std::rc::Rc;

fn store() -> TaskStore<MemoryBucketRepository> {
    TaskStore::new(MemoryBucketRepository::new(), &OrganizerConfig::default())
}

fn ticking_clock() -> impl Fn() -> i64 {
    let now = Cell::new(1_700_000_000_000_i64);
    move || {
        now.set(now.get() + 1);
        now.get()
    }
}

#[test]
fn group_completion_follows_children_and_moves_as_a_unit() {
    let mut store = store().with_clock(ticking_clock());
    let group = store.add(NewTask::group(Bucket::Today, "G1")).unwrap();
    let first = store
        .add(NewTask::subtask(Bucket::Today, group.clone(), "child one"))
        .unwrap();
    let second = store
        .add(NewTask::subtask(Bucket::Today, group.clone(), "child two"))
        .unwrap();
    assert_eq!(store.occupancy(Bucket::Today), Occupancy::from_halves(5));

    assert!(store.toggle(&first).unwrap());
    assert!(!store.get(&group).unwrap().is_completed());
    assert!(store.toggle(&second).unwrap());
    assert!(store.get(&group).unwrap().is_completed());

    let outcome = store
        .move_all(Bucket::Today, Bucket::Tomorrow, MoveFilter::Completed)
        .unwrap();
    assert_eq!(outcome.moved.len(), 3);
    assert_eq!(outcome.cost, Occupancy::from_halves(5));
    assert_eq!(store.occupancy(Bucket::Today), Occupancy::ZERO);
    assert_eq!(store.occupancy(Bucket::Tomorrow), Occupancy::from_halves(5));
    assert_eq!(store.children(&group).len(), 2);
    assert!(store.invariant_violations().is_empty());
}

#[test]
fn reopening_one_child_reopens_the_group() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Later, "Trip")).unwrap();
    let child = store
        .add(NewTask::subtask(Bucket::Later, group.clone(), "Book hotel"))
        .unwrap();

    store.toggle(&child).unwrap();
    assert!(store.get(&group).unwrap().is_completed());

    // Adding an incomplete child un-completes the group.
    store
        .add(NewTask::subtask(Bucket::Later, group.clone(), "Pack bags"))
        .unwrap();
    assert!(!store.get(&group).unwrap().is_completed());
}

#[test]
fn toggling_a_group_cascades_to_children() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Today, "Chores")).unwrap();
    let a = store.add(NewTask::subtask(Bucket::Today, group.clone(), "a")).unwrap();
    let b = store.add(NewTask::subtask(Bucket::Today, group.clone(), "b")).unwrap();

    assert!(store.toggle(&group).unwrap());
    assert!(store.get(&a).unwrap().is_completed());
    assert!(store.get(&b).unwrap().is_completed());

    assert!(!store.toggle(&group).unwrap());
    assert!(!store.get(&a).unwrap().is_completed());
}

#[test]
fn add_rejects_blank_titles_without_mutation() {
    let notifier = Rc::new(RecordingNotifier::new());
    let mut store = store().with_notifier(Rc::clone(&notifier));

    let err = store.add(NewTask::item(Bucket::Today, "   ")).unwrap_err();
    assert!(matches!(err, OrganizerError::EmptyTitle));
    assert!(store.query(Bucket::Today).is_empty());
    assert_eq!(notifier.last_severity(), Some(Severity::Warning));
}

#[test]
fn add_trims_titles() {
    let mut store = store();
    let id = store
        .add(NewTask::item(Bucket::Today, "  Buy milk  "))
        .unwrap();
    assert_eq!(store.get(&id).unwrap().title(), "Buy milk");
}

#[test]
fn quota_allows_filling_to_the_limit_and_no_further() {
    let notifier = Rc::new(RecordingNotifier::new());
    let mut store = store().with_notifier(Rc::clone(&notifier));

    for index in 0..9 {
        store
            .add(NewTask::item(Bucket::Today, format!("task {index}")))
            .unwrap();
    }
    store.add(NewTask::group(Bucket::Today, "first group")).unwrap();
    assert!(store.can_add(Bucket::Today, true));
    assert!(!store.can_add(Bucket::Today, false));

    let err = store
        .add(NewTask::item(Bucket::Today, "one too many"))
        .unwrap_err();
    match err {
        OrganizerError::QuotaExceeded {
            bucket,
            limit,
            occupancy,
            requested,
        } => {
            assert_eq!(bucket, Bucket::Today);
            assert_eq!(limit, 10);
            assert_eq!(occupancy, Occupancy::from_halves(19));
            assert_eq!(requested, Occupancy::ITEM);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(notifier.last_severity(), Some(Severity::Error));

    store.add(NewTask::group(Bucket::Today, "second group")).unwrap();
    assert_eq!(store.occupancy(Bucket::Today), Occupancy::from_halves(20));
    assert!(!store.can_add(Bucket::Today, true));
}

#[test]
fn pro_tier_is_unlimited() {
    let mut store = store().with_tier_source(|| Tier::Pro);
    for index in 0..12 {
        store
            .add(NewTask::item(Bucket::Later, format!("idea {index}")))
            .unwrap();
    }
    let summary = store.summary(Bucket::Later);
    assert_eq!(summary.total, 12);
    assert_eq!(summary.capacity, Capacity::Unlimited);
}

#[test]
fn tier_changes_apply_to_the_next_check() {
    let tier = Rc::new(Cell::new(Tier::Pro));
    let source = Rc::clone(&tier);
    let mut store = store().with_tier_source(move || source.get());

    for index in 0..6 {
        store
            .add(NewTask::item(Bucket::Later, format!("idea {index}")))
            .unwrap();
    }
    tier.set(Tier::Free);
    assert!(!store.can_add(Bucket::Later, true));
    assert!(matches!(
        store.add(NewTask::group(Bucket::Later, "blocked")),
        Err(OrganizerError::QuotaExceeded { .. })
    ));
}

#[test]
fn subtask_requires_group_in_same_bucket() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Today, "Errands")).unwrap();
    let item = store.add(NewTask::item(Bucket::Today, "Plain")).unwrap();

    assert!(matches!(
        store.add(NewTask::subtask(Bucket::Tomorrow, group.clone(), "elsewhere")),
        Err(OrganizerError::GroupNotFound(id)) if id == group
    ));
    assert!(matches!(
        store.add(NewTask::subtask(Bucket::Today, item.clone(), "under item")),
        Err(OrganizerError::NotAGroup(id)) if id == item
    ));
    assert_eq!(store.query(Bucket::Today).len(), 2);
}

#[test]
fn deleting_a_group_deletes_its_children() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Today, "Move house")).unwrap();
    let kid_a = store.add(NewTask::subtask(Bucket::Today, group.clone(), "boxes")).unwrap();
    let kid_b = store.add(NewTask::subtask(Bucket::Today, group.clone(), "van")).unwrap();
    store.add(NewTask::item(Bucket::Today, "unrelated")).unwrap();
    store.toggle_expanded(&group).unwrap();

    let removed = store.delete(&group).unwrap();
    assert_eq!(removed[0], group);
    assert_eq!(removed.len(), 3);
    assert!(removed.contains(&kid_a));
    assert!(removed.contains(&kid_b));
    assert_eq!(store.query(Bucket::Today).len(), 1);
    assert!(!store.is_expanded(&group));
    assert!(store.invariant_violations().is_empty());
}

#[test]
fn delete_reports_how_many_tasks_went() {
    let notifier = Rc::new(RecordingNotifier::new());
    let mut store = store().with_notifier(Rc::clone(&notifier));
    let group = store.add(NewTask::group(Bucket::Tomorrow, "Errands")).unwrap();
    store
        .add(NewTask::subtask(Bucket::Tomorrow, group.clone(), "bank"))
        .unwrap();

    store.delete(&group).unwrap();
    assert_eq!(notifier.last_severity(), Some(Severity::Success));
    let messages = notifier.drain();
    assert_eq!(messages.last().unwrap().0, "Deleted 2 task(s)");
}

#[test]
fn deleting_last_incomplete_child_completes_the_group() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Today, "Report")).unwrap();
    let done = store.add(NewTask::subtask(Bucket::Today, group.clone(), "draft")).unwrap();
    let open = store.add(NewTask::subtask(Bucket::Today, group.clone(), "review")).unwrap();
    store.toggle(&done).unwrap();
    assert!(!store.get(&group).unwrap().is_completed());

    store.delete(&open).unwrap();
    assert!(store.get(&group).unwrap().is_completed());
}

#[test]
fn delete_unknown_id_is_not_found() {
    let mut store = store();
    let missing = TaskId::generate();
    assert!(matches!(
        store.delete(&missing),
        Err(OrganizerError::TaskNotFound(id)) if id == missing
    ));
}

#[test]
fn edit_replaces_title_and_rejects_blank() {
    let mut store = store();
    let id = store.add(NewTask::item(Bucket::Today, "old")).unwrap();

    store.edit(&id, "  2. new  ").unwrap();
    assert_eq!(store.get(&id).unwrap().title(), "2. new");

    assert!(matches!(store.edit(&id, ""), Err(OrganizerError::EmptyTitle)));
    assert_eq!(store.get(&id).unwrap().title(), "2. new");
}

#[test]
fn query_orders_by_priority_then_groups_then_age() {
    let mut store = store().with_clock(ticking_clock());
    store.add(NewTask::item(Bucket::Today, "plain first")).unwrap();
    store.add(NewTask::item(Bucket::Today, "2. B")).unwrap();
    store.add(NewTask::group(Bucket::Today, "a group")).unwrap();
    store.add(NewTask::item(Bucket::Today, "1.1 C")).unwrap();
    store.add(NewTask::item(Bucket::Today, "1. A")).unwrap();

    let titles = store
        .query(Bucket::Today)
        .iter()
        .map(|task| task.title().to_string())
        .collect::<Vec<_>>();
    assert_eq!(titles, vec!["1. A", "1.1 C", "2. B", "a group", "plain first"]);
}

#[test]
fn clear_completed_removes_done_tasks_and_completed_groups() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Today, "Done group")).unwrap();
    let child = store.add(NewTask::subtask(Bucket::Today, group.clone(), "only child")).unwrap();
    let open_group = store.add(NewTask::group(Bucket::Today, "Open group")).unwrap();
    let done_child = store
        .add(NewTask::subtask(Bucket::Today, open_group.clone(), "finished"))
        .unwrap();
    store
        .add(NewTask::subtask(Bucket::Today, open_group.clone(), "pending"))
        .unwrap();
    let done_item = store.add(NewTask::item(Bucket::Today, "done item")).unwrap();
    store.add(NewTask::item(Bucket::Today, "open item")).unwrap();

    store.toggle(&child).unwrap();
    store.toggle(&done_child).unwrap();
    store.toggle(&done_item).unwrap();

    assert_eq!(store.clear_completed(Bucket::Today), 4);
    let remaining = store.query(Bucket::Today);
    assert_eq!(remaining.len(), 3);
    assert!(remaining.iter().all(|task| !task.is_completed()));
    assert!(store.invariant_violations().is_empty());

    assert_eq!(store.clear_completed(Bucket::Today), 0);
}

#[test]
fn summary_counts_completed_and_capacity() {
    let mut store = store();
    let id = store.add(NewTask::item(Bucket::Tomorrow, "a")).unwrap();
    store.add(NewTask::group(Bucket::Tomorrow, "b")).unwrap();
    store.toggle(&id).unwrap();

    let summary = store.summary(Bucket::Tomorrow);
    assert_eq!(summary.total, 2);
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.occupancy.to_string(), "1.5");
    assert_eq!(summary.capacity, Capacity::Limited(7));
}

#[test]
fn toggle_expanded_only_accepts_groups() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Today, "g")).unwrap();
    let item = store.add(NewTask::item(Bucket::Today, "i")).unwrap();

    assert!(!store.is_expanded(&group));
    assert!(store.toggle_expanded(&group).unwrap());
    assert!(store.is_expanded(&group));
    assert!(!store.toggle_expanded(&group).unwrap());
    assert!(matches!(
        store.toggle_expanded(&item),
        Err(OrganizerError::NotAGroup(_))
    ));
}
