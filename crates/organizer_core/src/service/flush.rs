//! Deferred durable-write queue.
//!
//! Accepted mutations mark their targets dirty here; a later flush writes
//! them out. A failed write stays queued until a flush succeeds.

use crate::model::bucket::Bucket;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// One persisted record set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum WriteTarget {
    Bucket(Bucket),
    ExpandedGroups,
}

impl Display for WriteTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bucket(bucket) => f.write_str(bucket.storage_key()),
            Self::ExpandedGroups => f.write_str(crate::repo::EXPANDED_GROUPS_KEY),
        }
    }
}

/// Set of targets waiting for a durable write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingWrites {
    targets: BTreeSet<WriteTarget>,
}

impl PendingWrites {
    pub fn mark(&mut self, target: WriteTarget) {
        self.targets.insert(target);
    }

    pub fn mark_bucket(&mut self, bucket: Bucket) {
        self.mark(WriteTarget::Bucket(bucket));
    }

    /// Marks every bucket and the expanded-groups table.
    pub fn mark_all(&mut self) {
        for bucket in Bucket::ALL {
            self.mark_bucket(bucket);
        }
        self.mark(WriteTarget::ExpandedGroups);
    }

    pub fn complete(&mut self, target: WriteTarget) {
        self.targets.remove(&target);
    }

    /// Pending targets in stable order.
    pub fn targets(&self) -> Vec<WriteTarget> {
        self.targets.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
