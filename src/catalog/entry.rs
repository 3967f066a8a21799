//! Catalog Entry definitions
//!
//! Defines the metadata record for one file or directory.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::path::LogicalPath;

/// A single catalog record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// File or directory
    pub kind: EntryKind,

    /// Final path component (never contains `/`)
    pub name: String,

    /// Rendered parent directory, `/` for top-level entries
    pub parent_path: String,

    /// Start of the content within the data region (0 for directories)
    pub offset: u64,

    /// Content length in bytes (0 for directories)
    pub size: u32,

    /// Creation time (unix seconds)
    pub timestamp: i64,

    /// Active or tombstoned
    pub status: EntryStatus,
}

/// Kind of catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    File,
    Directory,
}

/// Lifecycle state of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryStatus {
    /// Visible to every operation
    Active,

    /// Tombstoned; kept until the next compaction
    Deleted,
}

impl Entry {
    /// Create an active file entry
    pub fn file(parent: &LogicalPath, name: &str, offset: u64, size: u32, timestamp: i64) -> Self {
        Self {
            kind: EntryKind::File,
            name: name.to_string(),
            parent_path: parent.to_string(),
            offset,
            size,
            timestamp,
            status: EntryStatus::Active,
        }
    }

    /// Create an active, zero-size directory entry
    pub fn directory(parent: &LogicalPath, name: &str, timestamp: i64) -> Self {
        Self {
            kind: EntryKind::Directory,
            name: name.to_string(),
            parent_path: parent.to_string(),
            offset: 0,
            size: 0,
            timestamp,
            status: EntryStatus::Active,
        }
    }

    /// Full logical path of this entry
    pub fn path(&self) -> Result<LogicalPath> {
        LogicalPath::from_parts(&self.parent_path, &self.name)
    }

    pub fn is_active(&self) -> bool {
        self.status == EntryStatus::Active
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// One past the last content byte
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.size as u64)
    }
}

/// Current time in unix seconds
pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
