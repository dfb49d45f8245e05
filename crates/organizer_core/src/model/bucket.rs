//! Time buckets and the three-way task collection.

use crate::model::task::{Task, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Time partition a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Today,
    Tomorrow,
    Later,
}

impl Bucket {
    /// All buckets in display order.
    pub const ALL: [Bucket; 3] = [Bucket::Today, Bucket::Tomorrow, Bucket::Later];

    /// Stable wire value used in the `tab` record field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
            Self::Later => "later",
        }
    }

    /// Persistence key of the record set holding this bucket.
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Today => "todos",
            Self::Tomorrow => "tomorrowTodos",
            Self::Later => "laterTodos",
        }
    }

    /// User-facing label used in notifications.
    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Tomorrow => "Tomorrow",
            Self::Later => "Later",
        }
    }

    /// Parses a `tab` wire value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "today" => Some(Self::Today),
            "tomorrow" => Some(Self::Tomorrow),
            "later" => Some(Self::Later),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Today => 0,
            Self::Tomorrow => 1,
            Self::Later => 2,
        }
    }
}

impl Display for Bucket {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owned task vectors for all three buckets.
///
/// Insertion order is kept as-is; display order always comes from the sorter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSet {
    slots: [Vec<Task>; 3],
}

impl BucketSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bucket: Bucket) -> &[Task] {
        &self.slots[bucket.index()]
    }

    pub(crate) fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<Task> {
        &mut self.slots[bucket.index()]
    }

    /// Replaces one bucket wholesale.
    pub(crate) fn replace(&mut self, bucket: Bucket, tasks: Vec<Task>) {
        self.slots[bucket.index()] = tasks;
    }

    /// Finds a task by id in any bucket.
    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.slots.iter().flatten().find(|task| task.id() == id)
    }

    /// Returns the bucket currently holding `id`.
    pub fn locate(&self, id: &TaskId) -> Option<Bucket> {
        Bucket::ALL
            .into_iter()
            .find(|bucket| self.get(*bucket).iter().any(|task| task.id() == id))
    }

    /// Iterates `(bucket, tasks)` pairs in display order.
    pub fn iter(&self) -> impl Iterator<Item = (Bucket, &[Task])> {
        Bucket::ALL
            .into_iter()
            .map(move |bucket| (bucket, self.get(bucket)))
    }

    /// Total number of tasks across all buckets.
    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::{Bucket, BucketSet};
    use crate::model::task::Task;

    #[test]
    fn wire_values_round_trip() {
        for bucket in Bucket::ALL {
            assert_eq!(Bucket::parse(bucket.as_str()), Some(bucket));
        }
        assert_eq!(Bucket::parse("someday"), None);
    }

    #[test]
    fn storage_keys_match_persisted_layout() {
        assert_eq!(Bucket::Today.storage_key(), "todos");
        assert_eq!(Bucket::Tomorrow.storage_key(), "tomorrowTodos");
        assert_eq!(Bucket::Later.storage_key(), "laterTodos");
    }

    #[test]
    fn locate_finds_owning_bucket() {
        let mut set = BucketSet::new();
        let task = Task::item("Call bank", Bucket::Later, 1).unwrap();
        let id = task.id().clone();
        set.get_mut(Bucket::Later).push(task);

        assert_eq!(set.locate(&id), Some(Bucket::Later));
        assert_eq!(set.len(), 1);
        assert!(set.find(&id).is_some());
    }
}
