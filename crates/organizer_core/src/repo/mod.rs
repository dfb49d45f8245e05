//! Persistence collaborators for the task store.
//!
//! # Responsibility
//! - Define the read/write contract the store flushes accepted mutations to.
//! - Isolate SQLite and JSON details from organizer logic.
//!
//! # Invariants
//! - Repositories never validate organizer invariants; the store does.
//! - Repository failures surface as `RepoError`, never as panics.

pub mod bucket_repo;
pub mod memory_repo;
pub mod record;

pub use bucket_repo::{
    BucketRepository, RepoError, RepoResult, SqliteBucketRepository, EXPANDED_GROUPS_KEY,
};
pub use memory_repo::MemoryBucketRepository;
pub use record::{OrganizerSnapshot, TaskRecord};
