//! Task organizer domain model.
//!
//! # Responsibility
//! - Define the task shape shared by every organizer operation.
//! - Keep bucket membership, priority metadata and tier inputs strongly typed.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId` unique across all buckets.
//! - Group tasks can never carry a parent reference.
//! - Deletion is terminal; there are no tombstones in the organizer.

pub mod bucket;
pub mod priority;
pub mod task;
pub mod tier;
