//! Storage Module
//!
//! Single-file persistent storage for the catalog and file contents.
//!
//! ## Responsibilities
//! - Validate and decode the backing file on open
//! - Append new content without touching existing bytes
//! - Atomic whole-file rewrites after every mutation
//!
//! ## File Format (V1)
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header                                 │
//! │ ┌──────────┬────────┬────────┬───────┐ │
//! │ │Magic (4) │Ver (1) │MetaLen │MetaCRC│ │
//! │ └──────────┴────────┴────────┴───────┘ │
//! ├────────────────────────────────────────┤
//! │ Metadata Table                         │
//! │ ┌────────┬────────┬─────────┬───────┐  │
//! │ │ Count  │ RecLen │ Record  │  ...  │  │
//! │ └────────┴────────┴─────────┴───────┘  │
//! ├────────────────────────────────────────┤
//! │ Data Region                            │
//! │  raw file contents, addressed by       │
//! │  (offset, size) relative to its start  │
//! └────────────────────────────────────────┘
//! ```

pub mod codec;
mod manager;

pub use manager::StorageManager;
