//! Catalog Module
//!
//! In-memory model of every file and directory in the store.
//!
//! ## Responsibilities
//! - Keep entries in insertion order (listing order)
//! - Resolve logical paths to active entries
//! - Tombstone entries without moving any content bytes
//! - Validate invariants after a load
//!
//! ## Invariants
//! - Active names are unique per parent directory
//! - A directory with active children is never tombstoned
//! - Active file ranges lie inside the data region and never overlap
//!   each other (they may overlap tombstoned ranges)

mod entry;
mod table;

pub use entry::{now_secs, Entry, EntryKind, EntryStatus};
pub use table::{Catalog, Usage};
