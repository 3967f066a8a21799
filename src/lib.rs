//! # plusfs
//!
//! An embedded, single-file supplemental file store with:
//! - A catalog of files and directories addressed by `+`-prefixed paths
//! - Append-only content writes with tombstone deletion
//! - Compaction that repacks live content without gaps
//! - Atomic whole-file rewrites (write temp, fsync, rename)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Shell / plusfs binary                       │
//! │          (tokens → Location / LogicalPath → Command)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Engine                                │
//! │     cp · show · ls · mkdir · rmdir · rm · merge · export     │
//! └──────┬──────────────────────┬──────────────────────┬────────┘
//!        │                      │                      │
//!        ▼                      ▼                      ▼
//!   ┌──────────┐         ┌─────────────┐        ┌─────────────┐
//!   │ Catalog  │         │  Compactor  │        │   HostIo    │
//!   │ (Vec of  │         │ (dense data │        │ (host file  │
//!   │ entries) │         │   region)   │        │   bytes)    │
//!   └──────────┘         └──────┬──────┘        └─────────────┘
//!                               │
//!                               ▼
//!                      ┌─────────────────┐
//!                      │ StorageManager  │
//!                      │ header · table  │
//!                      │  · data region  │
//!                      └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod path;
pub mod namespace;
pub mod host;
pub mod catalog;
pub mod storage;
pub mod compactor;
pub mod command;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{PfsError, Result};
pub use config::{CompactionPolicy, Config, SyncStrategy};
pub use catalog::{Catalog, Entry, EntryKind, EntryStatus, Usage};
pub use command::{Command, Listing, Output};
pub use engine::Engine;
pub use namespace::Location;
pub use path::LogicalPath;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of plusfs
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
