//! Command definitions
//!
//! One `Command` per user call, already resolved into locations, and the
//! `Output` each one produces.

use std::path::PathBuf;

use crate::catalog::{Entry, EntryKind, Usage};
use crate::compactor::CompactionStats;
use crate::namespace::Location;
use crate::path::LogicalPath;

/// Commands accepted by [`crate::Engine::execute`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Copy a store or host file into the store
    Cp { src: Location, dst: Location },

    /// Read a stored file
    Show { path: LogicalPath },

    /// List a file or directory
    Ls { path: LogicalPath },

    /// Create a directory
    Mkdir { path: LogicalPath },

    /// Remove an empty directory
    Rmdir { path: LogicalPath },

    /// Remove a file
    Rm { path: LogicalPath },

    /// Concatenate two sources into a destination
    Merge {
        src1: Location,
        src2: Location,
        dst: Location,
    },

    /// Copy a stored file out to the host
    Export { src: LogicalPath, dst: PathBuf },

    /// Compact the store now
    Compact,

    /// Report space usage
    Stat,
}

impl Command {
    /// Name of the command (for logging)
    pub fn name(&self) -> &'static str {
        match self {
            Command::Cp { .. } => "cp",
            Command::Show { .. } => "show",
            Command::Ls { .. } => "ls",
            Command::Mkdir { .. } => "mkdir",
            Command::Rmdir { .. } => "rmdir",
            Command::Rm { .. } => "rm",
            Command::Merge { .. } => "merge",
            Command::Export { .. } => "export",
            Command::Compact => "compact",
            Command::Stat => "stat",
        }
    }

    /// Whether the command rewrites the store
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Cp { .. }
                | Command::Mkdir { .. }
                | Command::Rmdir { .. }
                | Command::Rm { .. }
                | Command::Merge { .. }
                | Command::Compact
        )
    }
}

/// Result of executing a command
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Mutation applied, nothing to print
    Done,

    /// File contents
    Content(Vec<u8>),

    /// Directory or file listing
    Listing(Vec<Listing>),

    /// Compaction summary
    Compacted(CompactionStats),

    /// Space usage
    Usage(Usage),
}

/// One row of an `ls` result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub name: String,
    pub kind: EntryKind,
    pub size: u32,
    /// Unix seconds
    pub timestamp: i64,
}

impl From<&Entry> for Listing {
    fn from(entry: &Entry) -> Self {
        Self {
            name: entry.name.clone(),
            kind: entry.kind,
            size: entry.size,
            timestamp: entry.timestamp,
        }
    }
}
