//! In-process bucket repository.
//!
//! Payloads are kept as JSON strings so reads exercise the same decoding path
//! as the SQLite repository.

use crate::model::bucket::Bucket;
use crate::repo::bucket_repo::{BucketRepository, RepoResult, EXPANDED_GROUPS_KEY};
use crate::repo::record::TaskRecord;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Map-backed repository for tests, previews and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBucketRepository {
    payloads: RefCell<BTreeMap<String, String>>,
    writes: Cell<usize>,
}

impl MemoryBucketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON stored under `key`, if any.
    pub fn payload(&self, key: &str) -> Option<String> {
        self.payloads.borrow().get(key).cloned()
    }

    /// Stores a raw payload, bypassing encoding.
    pub fn put_payload(&self, key: &str, payload: impl Into<String>) {
        self.payloads
            .borrow_mut()
            .insert(key.to_string(), payload.into());
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    fn read_json<T: serde::de::DeserializeOwned + Default>(&self, key: &str) -> RepoResult<T> {
        match self.payloads.borrow().get(key) {
            Some(payload) => Ok(serde_json::from_str(payload)?),
            None => Ok(T::default()),
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) -> RepoResult<()> {
        let payload = serde_json::to_string(value)?;
        self.put_payload(key, payload);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl BucketRepository for MemoryBucketRepository {
    fn read_bucket(&self, bucket: Bucket) -> RepoResult<Vec<TaskRecord>> {
        self.read_json(bucket.storage_key())
    }

    fn write_bucket(&self, bucket: Bucket, records: &[TaskRecord]) -> RepoResult<()> {
        self.write_json(bucket.storage_key(), records)
    }

    fn read_expanded_groups(&self) -> RepoResult<BTreeMap<String, bool>> {
        self.read_json(EXPANDED_GROUPS_KEY)
    }

    fn write_expanded_groups(&self, state: &BTreeMap<String, bool>) -> RepoResult<()> {
        self.write_json(EXPANDED_GROUPS_KEY, state)
    }
}
