//! Task store aggregate root.
//!
//! # Responsibility
//! - Own all three buckets and route every mutation through one place.
//! - Compose quota, completion, orphan and move rules into user operations.
//! - Hand accepted mutations to the persistence collaborator.
//!
//! # Invariants
//! - Every public mutation either fails with no state change or returns with
//!   all collection invariants satisfied.
//! - Persistence failures never roll back an accepted mutation; the write stays
//!   pending until a later flush succeeds.
//! - Query results are owned snapshots; callers cannot mutate stored tasks.

use crate::config::OrganizerConfig;
use crate::model::bucket::{Bucket, BucketSet};
use crate::model::task::{now_epoch_ms, Task, TaskId};
use crate::model::tier::{Capacity, Tier, TierSource};
use crate::notify::{LogNotifier, Notifier, Severity};
use crate::repo::{BucketRepository, OrganizerSnapshot, TaskRecord};
use crate::service::completion::{self, resync_group};
use crate::service::error::{OrganizerError, OrganizerResult};
use crate::service::flush::{PendingWrites, WriteTarget};
use crate::service::invariants::{audit, InvariantViolation};
use crate::service::mover::{self, MoveFilter, MoveOutcome};
use crate::service::orphan::{live_tasks, sweep};
use crate::service::quota::{Occupancy, QuotaEnforcer};
use crate::service::sorter::sorted;
use log::{debug, info, warn};
use std::collections::{BTreeMap, HashSet};

/// Shape of a task to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewTaskKind {
    Item,
    Group,
    /// Item attached to an existing group in the same bucket.
    Subtask { group_id: TaskId },
}

/// Add request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub bucket: Bucket,
    pub title: String,
    pub kind: NewTaskKind,
}

impl NewTask {
    pub fn item(bucket: Bucket, title: impl Into<String>) -> Self {
        Self {
            bucket,
            title: title.into(),
            kind: NewTaskKind::Item,
        }
    }

    pub fn group(bucket: Bucket, title: impl Into<String>) -> Self {
        Self {
            bucket,
            title: title.into(),
            kind: NewTaskKind::Group,
        }
    }

    pub fn subtask(bucket: Bucket, group_id: TaskId, title: impl Into<String>) -> Self {
        Self {
            bucket,
            title: title.into(),
            kind: NewTaskKind::Subtask { group_id },
        }
    }
}

/// Counts for one bucket, computed over the orphan-free view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSummary {
    pub bucket: Bucket,
    pub total: usize,
    pub completed: usize,
    pub occupancy: Occupancy,
    pub capacity: Capacity,
}

/// The organizer's single mutable collection.
pub struct TaskStore<R: BucketRepository> {
    repo: R,
    buckets: BucketSet,
    expanded: BTreeMap<TaskId, bool>,
    quota: QuotaEnforcer,
    tier_source: Box<dyn TierSource>,
    notifier: Box<dyn Notifier>,
    pending: PendingWrites,
    auto_flush: bool,
    clock: Box<dyn Fn() -> i64>,
    notes: Vec<serde_json::Value>,
    note_folders: Vec<serde_json::Value>,
}

impl<R: BucketRepository> TaskStore<R> {
    /// Creates an empty store.
    pub fn new(repo: R, config: &OrganizerConfig) -> Self {
        Self {
            repo,
            buckets: BucketSet::new(),
            expanded: BTreeMap::new(),
            quota: QuotaEnforcer::new(config.quota),
            tier_source: Box::new(config.default_tier),
            notifier: Box::new(LogNotifier),
            pending: PendingWrites::default(),
            auto_flush: config.auto_flush,
            clock: Box::new(now_epoch_ms),
            notes: Vec::new(),
            note_folders: Vec::new(),
        }
    }

    /// Loads every bucket from `repo` and heals what it finds.
    ///
    /// Records without a usable id or title and duplicate ids are skipped,
    /// orphans are swept and group flags are resynced; healed buckets are
    /// queued for the next flush.
    pub fn load(repo: R, config: &OrganizerConfig) -> OrganizerResult<Self> {
        let mut records = Vec::with_capacity(Bucket::ALL.len());
        for bucket in Bucket::ALL {
            records.push((bucket, repo.read_bucket(bucket)?));
        }
        let expanded = repo.read_expanded_groups()?;

        let mut store = Self::new(repo, config);
        store.ingest(&records, &expanded);
        info!(
            "event=store_load module=store status=ok tasks={} pending={}",
            store.buckets.len(),
            store.pending.targets().len()
        );
        Ok(store)
    }

    /// Builds a store from a full snapshot; everything is queued for writing.
    pub fn from_snapshot(repo: R, config: &OrganizerConfig, snapshot: &OrganizerSnapshot) -> Self {
        let records = Bucket::ALL
            .into_iter()
            .map(|bucket| (bucket, snapshot.records(bucket).to_vec()))
            .collect::<Vec<_>>();

        let mut store = Self::new(repo, config);
        store.ingest(&records, &snapshot.expanded_groups);
        store.notes = snapshot.notes.clone();
        store.note_folders = snapshot.note_folders.clone();
        store.pending.mark_all();
        store
    }

    /// Replaces the outcome notifier (defaults to [`LogNotifier`]).
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    /// Replaces the tier source consulted on every quota check.
    pub fn with_tier_source(mut self, tier_source: impl TierSource + 'static) -> Self {
        self.tier_source = Box::new(tier_source);
        self
    }

    /// Replaces the creation-time clock (epoch milliseconds).
    pub fn with_clock(mut self, clock: impl Fn() -> i64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Persistence collaborator this store flushes to.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Quota rules in effect.
    pub fn quota(&self) -> &QuotaEnforcer {
        &self.quota
    }

    /// Tier in effect right now.
    pub fn tier(&self) -> Tier {
        self.tier_source.current_tier()
    }

    /// Creates a task after title and quota checks.
    pub fn add(&mut self, request: NewTask) -> OrganizerResult<TaskId> {
        let bucket = request.bucket;
        let result = self.try_add(request);
        match &result {
            Ok(id) => {
                info!("event=task_add module=store status=ok bucket={bucket} id={id}");
                self.notifier
                    .notify(&format!("Task added to {}", bucket.label()), Severity::Success);
                self.persist();
            }
            Err(err) => self.report_rejection("task_add", err),
        }
        result
    }

    /// Deletes a task; deleting a group deletes all of its children.
    ///
    /// Returns every removed id, the target first.
    pub fn delete(&mut self, id: &TaskId) -> OrganizerResult<Vec<TaskId>> {
        let result = self.try_delete(id);
        match &result {
            Ok(removed) => {
                info!(
                    "event=task_delete module=store status=ok id={id} removed={}",
                    removed.len()
                );
                self.notifier.notify(
                    &format!("Deleted {} task(s)", removed.len()),
                    Severity::Success,
                );
                self.persist();
            }
            Err(err) => self.report_rejection("task_delete", err),
        }
        result
    }

    /// Replaces a task's title.
    pub fn edit(&mut self, id: &TaskId, title: &str) -> OrganizerResult<()> {
        let result = self.try_edit(id, title);
        match &result {
            Ok(()) => {
                info!("event=task_edit module=store status=ok id={id}");
                self.persist();
            }
            Err(err) => self.report_rejection("task_edit", err),
        }
        result
    }

    /// Flips a task's completion; groups cascade, items resync their group.
    ///
    /// Returns the toggled task's new state.
    pub fn toggle(&mut self, id: &TaskId) -> OrganizerResult<bool> {
        let result = self.locate(id).and_then(|bucket| {
            let completed = completion::toggle(self.buckets.get_mut(bucket), id)?;
            self.pending.mark_bucket(bucket);
            Ok(completed)
        });
        match &result {
            Ok(completed) => {
                info!("event=task_toggle module=store status=ok id={id} completed={completed}");
                self.persist();
            }
            Err(err) => self.report_rejection("task_toggle", err),
        }
        result
    }

    /// Moves one item, or a group with its children, to another bucket.
    pub fn move_task(
        &mut self,
        id: &TaskId,
        from: Bucket,
        to: Bucket,
    ) -> OrganizerResult<MoveOutcome> {
        let tier = self.tier();
        let result = mover::move_task(&mut self.buckets, &self.quota, id, from, to, tier);
        self.finish_move("task_move", from, to, &result);
        result
    }

    /// Moves every top-level task matching `filter` from one bucket to another.
    pub fn move_all(
        &mut self,
        from: Bucket,
        to: Bucket,
        filter: MoveFilter,
    ) -> OrganizerResult<MoveOutcome> {
        let tier = self.tier();
        let result = mover::move_all(&mut self.buckets, &self.quota, from, to, filter, tier);
        self.finish_move("task_move_all", from, to, &result);
        result
    }

    /// Removes completed tasks (completed groups take their children along).
    ///
    /// Returns the number of removed tasks, orphans swept beforehand included.
    pub fn clear_completed(&mut self, bucket: Bucket) -> usize {
        let swept = self.sweep_bucket(bucket);

        let tasks = std::mem::take(self.buckets.get_mut(bucket));
        let doomed_groups = tasks
            .iter()
            .filter(|task| task.is_group() && task.is_completed())
            .map(|task| task.id().clone())
            .collect::<HashSet<_>>();
        let outcome = sweep(tasks, &doomed_groups);
        let (done, mut kept): (Vec<Task>, Vec<Task>) = outcome
            .kept
            .into_iter()
            .partition(Task::is_completed);

        let parents = done
            .iter()
            .filter_map(Task::group_id)
            .collect::<HashSet<_>>();
        for parent in parents {
            resync_group(&mut kept, parent);
        }
        self.buckets.replace(bucket, kept);

        let removed = swept + outcome.removed.len() + done.len();
        if removed == 0 {
            self.notifier.notify(
                &format!("No completed tasks to clear in {}", bucket.label()),
                Severity::Info,
            );
            return 0;
        }

        let before = self.expanded.len();
        for group_id in &doomed_groups {
            self.expanded.remove(group_id);
        }
        if self.expanded.len() != before {
            self.pending.mark(WriteTarget::ExpandedGroups);
        }
        self.pending.mark_bucket(bucket);
        info!("event=clear_completed module=store status=ok bucket={bucket} removed={removed}");
        self.notifier.notify(
            &format!("Cleared {removed} task(s) from {}", bucket.label()),
            Severity::Success,
        );
        self.persist();
        removed
    }

    /// Sweeps orphans out of `bucket`; returns how many were removed.
    pub fn reconcile(&mut self, bucket: Bucket) -> usize {
        let removed = self.sweep_bucket(bucket);
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Flips the expanded flag of a group and returns the new value.
    pub fn toggle_expanded(&mut self, group_id: &TaskId) -> OrganizerResult<bool> {
        let result = match self.buckets.find(group_id) {
            None => Err(OrganizerError::GroupNotFound(group_id.clone())),
            Some(task) if !task.is_group() => Err(OrganizerError::NotAGroup(group_id.clone())),
            Some(_) => {
                let expanded = !self.is_expanded(group_id);
                self.expanded.insert(group_id.clone(), expanded);
                self.pending.mark(WriteTarget::ExpandedGroups);
                Ok(expanded)
            }
        };
        match &result {
            Ok(_) => self.persist(),
            Err(err) => self.report_rejection("group_expand", err),
        }
        result
    }

    /// Sorted, orphan-free snapshot of one bucket.
    pub fn query(&self, bucket: Bucket) -> Vec<Task> {
        sorted(live_tasks(self.buckets.get(bucket)))
    }

    /// Sorted children of a group.
    pub fn children(&self, group_id: &TaskId) -> Vec<Task> {
        match self.buckets.locate(group_id) {
            Some(bucket) => sorted(
                self.buckets
                    .get(bucket)
                    .iter()
                    .filter(|task| task.is_child_of(group_id)),
            ),
            None => Vec::new(),
        }
    }

    /// Task with `id` in any bucket.
    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.buckets.find(id)
    }

    /// Whether the group is shown expanded; unknown ids are collapsed.
    pub fn is_expanded(&self, group_id: &TaskId) -> bool {
        self.expanded.get(group_id).copied().unwrap_or(false)
    }

    /// Weighted occupancy of the orphan-free view of `bucket`.
    pub fn occupancy(&self, bucket: Bucket) -> Occupancy {
        Occupancy::of_tasks(live_tasks(self.buckets.get(bucket)))
    }

    /// Advisory check for UI affordances; mutations re-check on their own.
    pub fn can_add(&self, bucket: Bucket, is_group: bool) -> bool {
        self.quota
            .can_add(bucket, self.buckets.get(bucket), is_group, self.tier())
    }

    /// Counts, occupancy and capacity of one bucket under the current tier.
    pub fn summary(&self, bucket: Bucket) -> BucketSummary {
        let live = live_tasks(self.buckets.get(bucket));
        BucketSummary {
            bucket,
            total: live.len(),
            completed: live.iter().filter(|task| task.is_completed()).count(),
            occupancy: Occupancy::of_tasks(live.iter().copied()),
            capacity: self.quota.capacity(bucket, self.tier()),
        }
    }

    /// Every broken invariant; empty after any public operation returns.
    pub fn invariant_violations(&self) -> Vec<InvariantViolation> {
        audit(&self.buckets)
    }

    /// Full persisted layout of the current state, orphans excluded.
    pub fn export_snapshot(&self) -> OrganizerSnapshot {
        let mut snapshot = OrganizerSnapshot {
            expanded_groups: self.expanded_wire(),
            notes: self.notes.clone(),
            note_folders: self.note_folders.clone(),
            ..OrganizerSnapshot::default()
        };
        for bucket in Bucket::ALL {
            *snapshot.records_mut(bucket) = self.bucket_records(bucket);
        }
        snapshot
    }

    /// Targets still waiting for a durable write.
    pub fn pending_writes(&self) -> Vec<WriteTarget> {
        self.pending.targets()
    }

    /// Writes every pending target; failed targets stay pending.
    ///
    /// Returns the number of targets written, or the first failure.
    pub fn flush(&mut self) -> OrganizerResult<usize> {
        let mut written = 0;
        let mut first_error = None;
        for target in self.pending.targets() {
            let result = match target {
                WriteTarget::Bucket(bucket) => {
                    self.repo.write_bucket(bucket, &self.bucket_records(bucket))
                }
                WriteTarget::ExpandedGroups => {
                    self.repo.write_expanded_groups(&self.expanded_wire())
                }
            };
            match result {
                Ok(()) => {
                    self.pending.complete(target);
                    written += 1;
                }
                Err(err) => {
                    warn!("event=flush module=store status=error target={target} error={err}");
                    first_error.get_or_insert(err);
                }
            }
        }
        debug!("event=flush module=store status=done written={written}");
        match first_error {
            Some(err) => Err(OrganizerError::PersistenceFailure(err)),
            None => Ok(written),
        }
    }

    fn try_add(&mut self, request: NewTask) -> OrganizerResult<TaskId> {
        let NewTask {
            bucket,
            title,
            kind,
        } = request;
        let created_at = (self.clock)();
        let task = match kind {
            NewTaskKind::Item => Task::item(&title, bucket, created_at)?,
            NewTaskKind::Group => Task::group(&title, bucket, created_at)?,
            NewTaskKind::Subtask { group_id } => {
                self.ensure_group_in(bucket, &group_id)?;
                Task::subtask(&title, bucket, group_id, created_at)?
            }
        };

        let tier = self.tier();
        self.quota.ensure_fits(
            bucket,
            self.buckets.get(bucket),
            Occupancy::of_task(&task),
            tier,
        )?;

        let id = task.id().clone();
        let parent = task.group_id().cloned();
        let tasks = self.buckets.get_mut(bucket);
        tasks.push(task);
        if let Some(parent) = &parent {
            resync_group(tasks, parent);
        }
        self.pending.mark_bucket(bucket);
        Ok(id)
    }

    fn try_delete(&mut self, id: &TaskId) -> OrganizerResult<Vec<TaskId>> {
        let bucket = self.locate(id)?;
        let tasks = std::mem::take(self.buckets.get_mut(bucket));
        let (is_group, parent) = tasks
            .iter()
            .find(|task| task.id() == id)
            .map(|task| (task.is_group(), task.group_id().cloned()))
            .unwrap_or((false, None));

        let doomed = if is_group {
            HashSet::from([id.clone()])
        } else {
            HashSet::new()
        };
        let outcome = sweep(tasks, &doomed);
        let mut kept = outcome.kept;
        kept.retain(|task| task.id() != id);
        if let Some(parent) = &parent {
            resync_group(&mut kept, parent);
        }
        self.buckets.replace(bucket, kept);

        if is_group && self.expanded.remove(id).is_some() {
            self.pending.mark(WriteTarget::ExpandedGroups);
        }
        self.pending.mark_bucket(bucket);

        let mut removed = vec![id.clone()];
        removed.extend(outcome.removed);
        Ok(removed)
    }

    fn try_edit(&mut self, id: &TaskId, title: &str) -> OrganizerResult<()> {
        let bucket = self.locate(id)?;
        let task = self
            .buckets
            .get_mut(bucket)
            .iter_mut()
            .find(|task| task.id() == id)
            .ok_or_else(|| OrganizerError::TaskNotFound(id.clone()))?;
        task.set_title(title)?;
        self.pending.mark_bucket(bucket);
        Ok(())
    }

    fn finish_move(
        &mut self,
        op: &'static str,
        from: Bucket,
        to: Bucket,
        result: &OrganizerResult<MoveOutcome>,
    ) {
        match result {
            Ok(outcome) if outcome.is_noop() => {
                debug!("event={op} module=store status=noop from={from} to={to}");
                self.notifier.notify(
                    &format!("Nothing to move to {}", to.label()),
                    Severity::Info,
                );
            }
            Ok(outcome) => {
                info!(
                    "event={op} module=store status=ok from={from} to={to} moved={} cost={}",
                    outcome.moved.len(),
                    outcome.cost
                );
                self.pending.mark_bucket(from);
                self.pending.mark_bucket(to);
                self.notifier.notify(
                    &format!("Moved {} task(s) to {}", outcome.moved.len(), to.label()),
                    Severity::Success,
                );
                self.persist();
            }
            Err(err) => self.report_rejection(op, err),
        }
    }

    fn locate(&self, id: &TaskId) -> OrganizerResult<Bucket> {
        self.buckets
            .locate(id)
            .ok_or_else(|| OrganizerError::TaskNotFound(id.clone()))
    }

    fn ensure_group_in(&self, bucket: Bucket, group_id: &TaskId) -> OrganizerResult<()> {
        match self.buckets.get(bucket).iter().find(|task| task.id() == group_id) {
            Some(task) if task.is_group() => Ok(()),
            Some(_) => Err(OrganizerError::NotAGroup(group_id.clone())),
            None => Err(OrganizerError::GroupNotFound(group_id.clone())),
        }
    }

    fn sweep_bucket(&mut self, bucket: Bucket) -> usize {
        let outcome = sweep(std::mem::take(self.buckets.get_mut(bucket)), &HashSet::new());
        let removed = outcome.removed_count();
        if let Some(warning) = outcome.warning(bucket) {
            warn!("event=orphan_sweep module=store status=healed bucket={bucket} removed={removed} detail={warning}");
            self.pending.mark_bucket(bucket);
        }
        self.buckets.replace(bucket, outcome.kept);
        removed
    }

    fn bucket_records(&self, bucket: Bucket) -> Vec<TaskRecord> {
        live_tasks(self.buckets.get(bucket))
            .into_iter()
            .map(TaskRecord::from)
            .collect()
    }

    fn expanded_wire(&self) -> BTreeMap<String, bool> {
        self.expanded
            .iter()
            .map(|(id, expanded)| (id.to_string(), *expanded))
            .collect()
    }

    fn persist(&mut self) {
        if !self.auto_flush || self.pending.is_empty() {
            return;
        }
        if let Err(err) = self.flush() {
            warn!("event=persist module=store status=deferred error={err}");
            self.notifier.notify(
                "Changes could not be saved yet; they will be retried",
                Severity::Warning,
            );
        }
    }

    fn report_rejection(&self, op: &'static str, err: &OrganizerError) {
        warn!("event={op} module=store status=rejected error={err}");
        let (message, severity) = match err {
            OrganizerError::EmptyTitle => {
                ("Task title cannot be empty".to_string(), Severity::Warning)
            }
            OrganizerError::QuotaExceeded { bucket, limit, .. } => (
                format!("{} list is full (limit {limit})", bucket.label()),
                Severity::Error,
            ),
            other => (other.to_string(), Severity::Error),
        };
        self.notifier.notify(&message, severity);
    }

    fn ingest(&mut self, records: &[(Bucket, Vec<TaskRecord>)], expanded: &BTreeMap<String, bool>) {
        let mut seen = HashSet::new();
        for (bucket, bucket_records) in records {
            let mut dirty = false;
            for record in bucket_records {
                match record.to_task(*bucket) {
                    Ok(task) if !seen.insert(task.id().clone()) => {
                        let err = OrganizerError::DuplicateId(task.id().clone());
                        warn!("event=store_load module=store status=skipped bucket={bucket} error={err}");
                        dirty = true;
                    }
                    Ok(task) => {
                        if record.tab.is_some_and(|tab| tab != *bucket) {
                            debug!("event=store_load module=store status=retagged bucket={bucket} id={}", task.id());
                            dirty = true;
                        }
                        self.buckets.get_mut(*bucket).push(task);
                    }
                    Err(err) => {
                        warn!("event=store_load module=store status=skipped bucket={bucket} error={err}");
                        dirty = true;
                    }
                }
            }
            if dirty {
                self.pending.mark_bucket(*bucket);
            }
            self.sweep_bucket(*bucket);
            self.resync_all_groups(*bucket);
        }

        for (raw_id, flag) in expanded {
            match TaskId::parse(raw_id) {
                Some(id) if self.buckets.find(&id).is_some_and(Task::is_group) => {
                    self.expanded.insert(id, *flag);
                }
                _ => self.pending.mark(WriteTarget::ExpandedGroups),
            }
        }
    }

    fn resync_all_groups(&mut self, bucket: Bucket) {
        let tasks = self.buckets.get_mut(bucket);
        let groups = tasks
            .iter()
            .filter(|task| task.is_group())
            .map(|task| (task.id().clone(), task.is_completed()))
            .collect::<Vec<_>>();
        let mut changed = false;
        for (group_id, before) in groups {
            if let Some(after) = resync_group(tasks, &group_id) {
                changed |= after != before;
            }
        }
        if changed {
            self.pending.mark_bucket(bucket);
        }
    }
}
