//! Catalog implementation
//!
//! Insertion-ordered Vec of entries. Tombstoned entries stay in place until
//! the compactor drops them, so indices are stable for the whole session.

use std::collections::HashSet;

use crate::error::{PfsError, Result};
use crate::path::{LogicalPath, SEPARATOR};
use crate::storage::codec;

use super::Entry;

/// In-memory model of every entry in the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<Entry>,
}

/// Space accounting for a catalog over a data region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Usage {
    /// Active files and directories
    pub active_entries: usize,

    /// Tombstoned entries awaiting compaction
    pub tombstones: usize,

    /// Length of the data region
    pub data_len: u64,

    /// Bytes referenced by active files
    pub live_bytes: u64,
}

impl Usage {
    /// Bytes compaction would reclaim
    pub fn garbage_bytes(&self) -> u64 {
        self.data_len.saturating_sub(self.live_bytes)
    }

    /// Reclaimable share of the data region
    ///
    /// An empty region with tombstone records counts as fully garbage so
    /// that directory-only stores still get their records purged.
    pub fn garbage_ratio(&self) -> f64 {
        if self.data_len == 0 {
            return if self.tombstones > 0 { 1.0 } else { 0.0 };
        }
        self.garbage_bytes() as f64 / self.data_len as f64
    }
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from already-ordered entries
    pub fn from_entries(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Parse a serialized catalog (header + metadata table)
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        codec::decode_image(bytes).map(|(catalog, _)| catalog)
    }

    /// Serialize to header + metadata table
    pub fn serialize(&self) -> Result<Vec<u8>> {
        codec::encode_image(self)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Find the active entry at `path`
    pub fn find_active(&self, path: &LogicalPath) -> Option<(usize, &Entry)> {
        let name = path.name()?;
        let parent = path.parent()?.to_string();

        self.entries
            .iter()
            .enumerate()
            .find(|(_, e)| e.is_active() && e.name == name && e.parent_path == parent)
    }

    /// Active entries directly under `dir`, in insertion order
    pub fn children<'a>(&'a self, dir: &LogicalPath) -> impl Iterator<Item = &'a Entry> + 'a {
        let key = dir.to_string();
        self.entries
            .iter()
            .filter(move |e| e.is_active() && e.parent_path == key)
    }

    /// Whether any active entry lives directly under `dir`
    pub fn has_active_children(&self, dir: &LogicalPath) -> bool {
        self.children(dir).next().is_some()
    }

    /// Append an entry, returning its index
    pub fn push(&mut self, entry: Entry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Mark the entry at `index` as deleted
    ///
    /// A directory with active children cannot be tombstoned.
    pub fn tombstone(&mut self, index: usize) -> Result<()> {
        let entry = self.entries.get(index).ok_or_else(|| {
            PfsError::NotFound(format!("catalog index {}", index))
        })?;

        if !entry.is_active() {
            return Err(PfsError::NotFound(format!(
                "{} is already deleted",
                entry.path()?
            )));
        }

        if entry.is_dir() {
            let path = entry.path()?;
            if self.has_active_children(&path) {
                return Err(PfsError::NotEmpty(path.to_string()));
            }
        }

        self.entries[index].status = super::EntryStatus::Deleted;
        Ok(())
    }

    /// Active file entries, in insertion order
    pub fn active_files(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().filter(|e| e.is_active() && e.is_file())
    }

    /// Space accounting against a data region of `data_len` bytes
    pub fn usage(&self, data_len: u64) -> Usage {
        let active_entries = self.entries.iter().filter(|e| e.is_active()).count();
        let live_bytes = self.active_files().map(|e| e.size as u64).sum();

        Usage {
            active_entries,
            tombstones: self.entries.len() - active_entries,
            data_len,
            live_bytes,
        }
    }

    /// Check every catalog invariant against a data region of `data_len` bytes
    ///
    /// Fails with `CorruptStore` on the first violation.
    pub fn validate(&self, data_len: u64) -> Result<()> {
        let mut active_paths: HashSet<(&str, &str)> = HashSet::new();
        let mut active_dirs: HashSet<String> = HashSet::new();
        let mut ranges: Vec<(u64, u64)> = Vec::new();

        for entry in &self.entries {
            if entry.name.is_empty() || entry.name.contains(SEPARATOR) {
                return Err(corrupt(format!("invalid entry name {:?}", entry.name)));
            }

            let parent = LogicalPath::parse(&entry.parent_path)
                .map_err(|_| corrupt(format!("invalid parent path {:?}", entry.parent_path)))?;
            if parent.to_string() != entry.parent_path {
                return Err(corrupt(format!(
                    "non-canonical parent path {:?}",
                    entry.parent_path
                )));
            }

            if entry.is_dir() && (entry.offset != 0 || entry.size != 0) {
                return Err(corrupt(format!(
                    "directory {} carries a data range",
                    parent.join(&entry.name)
                )));
            }

            if !entry.is_active() {
                continue;
            }

            if !active_paths.insert((entry.parent_path.as_str(), entry.name.as_str())) {
                return Err(corrupt(format!(
                    "duplicate active entry {}",
                    parent.join(&entry.name)
                )));
            }

            if entry.is_dir() {
                active_dirs.insert(parent.join(&entry.name).to_string());
            } else {
                if entry.end() > data_len {
                    return Err(corrupt(format!(
                        "{} ends at {} past data region of {} bytes",
                        parent.join(&entry.name),
                        entry.end(),
                        data_len
                    )));
                }
                if entry.size > 0 {
                    ranges.push((entry.offset, entry.end()));
                }
            }
        }

        // Every active entry must hang off the root or an active directory
        for entry in self.entries.iter().filter(|e| e.is_active()) {
            if entry.parent_path != "/" && !active_dirs.contains(&entry.parent_path) {
                return Err(corrupt(format!(
                    "{} has no active parent directory {}",
                    entry.name, entry.parent_path
                )));
            }
        }

        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            if pair[0].1 > pair[1].0 {
                return Err(corrupt(format!(
                    "active ranges overlap at offset {}",
                    pair[1].0
                )));
            }
        }

        Ok(())
    }
}

fn corrupt(msg: String) -> PfsError {
    PfsError::CorruptStore(msg)
}
