//! Organizer rules and the store that composes them.
//!
//! # Responsibility
//! - Keep each organizer rule (ordering, quota, completion, orphans, moves)
//!   in its own pure module over task slices.
//! - Expose `TaskStore` as the only type that mutates the collection.
//!
//! # Invariants
//! - Rule modules never touch persistence or notifications.

pub mod completion;
pub mod error;
pub mod flush;
pub mod invariants;
pub mod mover;
pub mod orphan;
pub mod quota;
pub mod sorter;
pub mod task_store;
