use organizer_core::{
    Bucket, MemoryBucketRepository, MoveFilter, NewTask, Occupancy, OrganizerConfig,
    OrganizerError, TaskStore,
};

fn store() -> TaskStore<MemoryBucketRepository> {
    TaskStore::new(MemoryBucketRepository::new(), &OrganizerConfig::default())
}

#[test]
fn group_with_children_moves_together() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Today, "Garden")).unwrap();
    for title in ["weed", "water", "mow"] {
        store
            .add(NewTask::subtask(Bucket::Today, group.clone(), title))
            .unwrap();
    }
    store.add(NewTask::item(Bucket::Today, "stays")).unwrap();

    let outcome = store.move_task(&group, Bucket::Today, Bucket::Later).unwrap();
    assert_eq!(outcome.moved.len(), 4);
    assert_eq!(outcome.cost, Occupancy::GROUP);
    assert_eq!(store.query(Bucket::Today).len(), 1);

    let later = store.query(Bucket::Later);
    assert_eq!(later.len(), 4);
    assert!(later.iter().all(|task| task.bucket() == Bucket::Later));
    assert_eq!(store.children(&group).len(), 3);
    assert!(store.invariant_violations().is_empty());
}

#[test]
fn moving_a_single_child_detaches_it() {
    let mut store = store();
    let group = store.add(NewTask::group(Bucket::Today, "Shopping")).unwrap();
    let open = store
        .add(NewTask::subtask(Bucket::Today, group.clone(), "bread"))
        .unwrap();
    let done = store
        .add(NewTask::subtask(Bucket::Today, group.clone(), "eggs"))
        .unwrap();
    store.toggle(&done).unwrap();

    let outcome = store.move_task(&open, Bucket::Today, Bucket::Tomorrow).unwrap();
    assert_eq!(outcome.detached_from, Some(group.clone()));

    let moved = store.get(&open).unwrap();
    assert_eq!(moved.group_id(), None);
    assert_eq!(moved.bucket(), Bucket::Tomorrow);
    // Remaining child is done, so the group follows it.
    assert!(store.get(&group).unwrap().is_completed());
    assert!(store.invariant_violations().is_empty());
}

#[test]
fn rejected_move_leaves_both_buckets_unchanged() {
    let mut store = store();
    for index in 0..5 {
        store
            .add(NewTask::item(Bucket::Later, format!("later {index}")))
            .unwrap();
    }
    let group = store.add(NewTask::group(Bucket::Today, "Big")).unwrap();
    store.add(NewTask::subtask(Bucket::Today, group.clone(), "x")).unwrap();
    let item = store.add(NewTask::item(Bucket::Today, "single")).unwrap();

    let before = store.export_snapshot();

    assert!(matches!(
        store.move_task(&item, Bucket::Today, Bucket::Later),
        Err(OrganizerError::QuotaExceeded { bucket: Bucket::Later, .. })
    ));
    assert!(matches!(
        store.move_all(Bucket::Today, Bucket::Later, MoveFilter::All),
        Err(OrganizerError::QuotaExceeded { .. })
    ));

    assert_eq!(store.export_snapshot(), before);
    assert!(store.pending_writes().is_empty());
}

#[test]
fn group_fills_last_half_slot_then_next_move_changes_nothing() {
    let mut store = store();
    for index in 0..4 {
        store
            .add(NewTask::item(Bucket::Later, format!("later {index}")))
            .unwrap();
    }
    store.add(NewTask::group(Bucket::Later, "parked")).unwrap();
    // Later holds 4.5 of 5: only a group still fits.
    assert_eq!(store.occupancy(Bucket::Later), Occupancy::from_halves(9));

    let group = store.add(NewTask::group(Bucket::Today, "Move out")).unwrap();
    let mut members = vec![group.clone()];
    for title in ["pack", "clean", "return keys"] {
        members.push(
            store
                .add(NewTask::subtask(Bucket::Today, group.clone(), title))
                .unwrap(),
        );
    }
    let item = store.add(NewTask::item(Bucket::Today, "stays put")).unwrap();

    let outcome = store.move_task(&group, Bucket::Today, Bucket::Later).unwrap();
    assert_eq!(outcome.moved.len(), 4);
    assert_eq!(outcome.cost, Occupancy::GROUP);
    assert_eq!(store.occupancy(Bucket::Later), Occupancy::from_halves(10));

    let snapshot = store.export_snapshot();
    for id in &members {
        let record = snapshot
            .later_todos
            .iter()
            .find(|record| record.id == id.to_string())
            .unwrap();
        assert_eq!(record.tab, Some(Bucket::Later));
        assert!(snapshot.todos.iter().all(|record| record.id != id.to_string()));
    }
    assert_eq!(snapshot.todos.len(), 1);
    assert_eq!(store.children(&group).len(), 3);

    assert!(matches!(
        store.move_task(&item, Bucket::Today, Bucket::Later),
        Err(OrganizerError::QuotaExceeded { bucket: Bucket::Later, .. })
    ));
    assert_eq!(store.export_snapshot(), snapshot);
    assert!(store.invariant_violations().is_empty());
}

#[test]
fn move_all_charges_children_and_fails_as_a_batch() {
    let mut store = store();
    for index in 0..4 {
        store
            .add(NewTask::item(Bucket::Later, format!("later {index}")))
            .unwrap();
    }
    let group = store.add(NewTask::group(Bucket::Today, "Batch")).unwrap();
    store.add(NewTask::subtask(Bucket::Today, group.clone(), "a")).unwrap();

    // Later holds 4.0 of 5; group (0.5) plus child (1) does not fit.
    assert!(store
        .move_all(Bucket::Today, Bucket::Later, MoveFilter::All)
        .is_err());
    // The group on its own is charged 0.5 and fits.
    store.move_task(&group, Bucket::Today, Bucket::Later).unwrap();
    assert_eq!(store.occupancy(Bucket::Later), Occupancy::from_halves(11));
    assert!(store.invariant_violations().is_empty());
}

#[test]
fn move_all_filters_by_completion() {
    let mut store = store();
    let done = store.add(NewTask::item(Bucket::Today, "done")).unwrap();
    store.add(NewTask::item(Bucket::Today, "open")).unwrap();
    store.toggle(&done).unwrap();

    let outcome = store
        .move_all(Bucket::Today, Bucket::Tomorrow, MoveFilter::Incomplete)
        .unwrap();
    assert_eq!(outcome.moved.len(), 1);
    assert_eq!(store.get(&done).unwrap().bucket(), Bucket::Today);
}

#[test]
fn same_bucket_and_empty_moves_are_noops() {
    let mut store = store();
    let id = store.add(NewTask::item(Bucket::Today, "here")).unwrap();

    assert!(store.move_task(&id, Bucket::Today, Bucket::Today)
        .unwrap()
        .is_noop());
    assert!(store
        .move_all(Bucket::Tomorrow, Bucket::Later, MoveFilter::All)
        .unwrap()
        .is_noop());
}

#[test]
fn move_from_wrong_bucket_is_rejected() {
    let mut store = store();
    let id = store.add(NewTask::item(Bucket::Today, "here")).unwrap();

    assert!(matches!(
        store.move_task(&id, Bucket::Tomorrow, Bucket::Later),
        Err(OrganizerError::NotInBucket { bucket: Bucket::Tomorrow, .. })
    ));
    assert_eq!(store.get(&id).unwrap().bucket(), Bucket::Today);
}
