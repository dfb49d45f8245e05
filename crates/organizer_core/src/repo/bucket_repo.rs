//! Bucket persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read and write whole record sets per bucket, plus expanded-group UI state.
//! - Keep SQL and JSON encoding details inside the repository boundary.
//!
//! # Invariants
//! - A write replaces the full record set for its key.
//! - A key that was never written reads back as empty, not as an error.
//! - Read paths reject undecodable payloads instead of masking them.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::bucket::Bucket;
use crate::repo::record::TaskRecord;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Persistence key of the expanded-groups side table.
pub const EXPANDED_GROUPS_KEY: &str = "expandedGroups";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from bucket persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Payload could not be encoded or decoded as JSON.
    Serialization(serde_json::Error),
    /// Decoded payload does not describe a valid task.
    InvalidData(String),
    /// Backend refused or could not complete the operation.
    Unavailable(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "invalid bucket payload: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "bucket repository requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) => None,
            Self::Unavailable(_) => None,
            Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persistence collaborator used by the task store.
pub trait BucketRepository {
    /// Loads the record set stored for `bucket`.
    fn read_bucket(&self, bucket: Bucket) -> RepoResult<Vec<TaskRecord>>;
    /// Replaces the record set stored for `bucket`.
    fn write_bucket(&self, bucket: Bucket, records: &[TaskRecord]) -> RepoResult<()>;
    /// Loads the group id → expanded map.
    fn read_expanded_groups(&self) -> RepoResult<BTreeMap<String, bool>>;
    /// Replaces the group id → expanded map.
    fn write_expanded_groups(&self, state: &BTreeMap<String, bool>) -> RepoResult<()>;
}

impl<R: BucketRepository + ?Sized> BucketRepository for &R {
    fn read_bucket(&self, bucket: Bucket) -> RepoResult<Vec<TaskRecord>> {
        (**self).read_bucket(bucket)
    }

    fn write_bucket(&self, bucket: Bucket, records: &[TaskRecord]) -> RepoResult<()> {
        (**self).write_bucket(bucket, records)
    }

    fn read_expanded_groups(&self) -> RepoResult<BTreeMap<String, bool>> {
        (**self).read_expanded_groups()
    }

    fn write_expanded_groups(&self, state: &BTreeMap<String, bool>) -> RepoResult<()> {
        (**self).write_expanded_groups(state)
    }
}

/// SQLite-backed bucket repository storing JSON payloads per key.
pub struct SqliteBucketRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBucketRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let actual_version =
            conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    fn read_payload(&self, key: &str) -> RepoResult<Option<String>> {
        let payload = self
            .conn
            .query_row(
                "SELECT payload FROM organizer_kv WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(payload)
    }

    fn write_payload(&self, key: &str, payload: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO organizer_kv (key, payload)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                payload = excluded.payload,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, payload],
        )?;
        Ok(())
    }
}

impl BucketRepository for SqliteBucketRepository<'_> {
    fn read_bucket(&self, bucket: Bucket) -> RepoResult<Vec<TaskRecord>> {
        match self.read_payload(bucket.storage_key())? {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(Vec::new()),
        }
    }

    fn write_bucket(&self, bucket: Bucket, records: &[TaskRecord]) -> RepoResult<()> {
        let payload = serde_json::to_string(records)?;
        self.write_payload(bucket.storage_key(), &payload)
    }

    fn read_expanded_groups(&self) -> RepoResult<BTreeMap<String, bool>> {
        match self.read_payload(EXPANDED_GROUPS_KEY)? {
            Some(payload) => Ok(serde_json::from_str(&payload)?),
            None => Ok(BTreeMap::new()),
        }
    }

    fn write_expanded_groups(&self, state: &BTreeMap<String, bool>) -> RepoResult<()> {
        let payload = serde_json::to_string(state)?;
        self.write_payload(EXPANDED_GROUPS_KEY, &payload)
    }
}
