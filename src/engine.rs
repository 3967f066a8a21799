//! Engine Module
//!
//! The entry operations, coordinating catalog, storage and compactor.
//!
//! ## Responsibilities
//! - Resolve logical paths against the catalog
//! - Enforce namespace rules (unique names, parents exist, empty rmdir)
//! - Append new content and persist every mutation with one rewrite
//! - Trigger compaction after tombstoning operations

use std::io;
use std::path::Path;

use crate::catalog::{now_secs, Catalog, Entry, Usage};
use crate::command::{Command, Listing, Output};
use crate::compactor::{self, CompactionStats};
use crate::config::Config;
use crate::error::{PfsError, Result};
use crate::host::{HostIo, LocalHost};
use crate::namespace::Location;
use crate::path::LogicalPath;
use crate::storage::StorageManager;

/// The supplemental store engine
///
/// ## Mutation Model
///
/// Every mutating operation works on a clone of the catalog. The clone is
/// written out with a single `rewrite`; only once that succeeds does it
/// replace the in-memory catalog. A failed operation therefore leaves both
/// the file and the engine exactly as they were (apart from unreferenced
/// appended bytes, which compaction reclaims).
///
/// Mutations take `&mut self`, so rewrites can never interleave.
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Backing file
    storage: StorageManager,

    /// Catalog matching the file on disk
    catalog: Catalog,

    /// Access to host files for non-supplemental sources
    host: Box<dyn HostIo>,
}

impl Engine {
    /// Open or create the store described by `config`
    ///
    /// Fails with `CorruptStore` if the existing file cannot be fully
    /// validated; the engine never operates on a partial interpretation.
    pub fn open(config: Config) -> Result<Self> {
        Self::with_host(config, Box::new(LocalHost))
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified store path
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().store_path(path).build();
        Self::open(config)
    }

    /// Open with a custom host I/O implementation
    pub fn with_host(config: Config, host: Box<dyn HostIo>) -> Result<Self> {
        let storage = StorageManager::open_or_create(&config.store_path, config.sync_strategy)?;
        let catalog = storage.load()?;

        tracing::info!(
            "Opened store {} ({} entries, {} data bytes)",
            config.store_path.display(),
            catalog.len(),
            storage.data_len()
        );

        Ok(Self {
            config,
            storage,
            catalog,
            host,
        })
    }

    /// Execute a command
    ///
    /// Routes commands to appropriate handlers
    pub fn execute(&mut self, command: Command) -> Result<Output> {
        tracing::debug!(
            "Executing {} (mutating: {})",
            command.name(),
            command.is_mutating()
        );

        match command {
            Command::Cp { src, dst } => self.cp(&src, &dst).map(|_| Output::Done),
            Command::Show { path } => self.show(&path).map(Output::Content),
            Command::Ls { path } => self.ls(&path).map(Output::Listing),
            Command::Mkdir { path } => self.mkdir(&path).map(|_| Output::Done),
            Command::Rmdir { path } => self.rmdir(&path).map(|_| Output::Done),
            Command::Rm { path } => self.rm(&path).map(|_| Output::Done),
            Command::Merge { src1, src2, dst } => {
                self.merge(&src1, &src2, &dst).map(|_| Output::Done)
            }
            Command::Export { src, dst } => self.export(&src, &dst).map(|_| Output::Done),
            Command::Compact => self.compact().map(Output::Compacted),
            Command::Stat => Ok(Output::Usage(self.usage())),
        }
    }

    // =========================================================================
    // Entry Operations
    // =========================================================================

    /// Copy `src` (store or host file) to the store path `dst`
    ///
    /// An existing file at `dst` is replaced: its entry is tombstoned and a
    /// fresh entry with the new content is appended.
    pub fn cp(&mut self, src: &Location, dst: &Location) -> Result<()> {
        let dst = self.destination(dst)?;
        let content = self.read_source(src)?;

        tracing::debug!("cp {} -> {} ({} bytes)", src, dst, content.len());
        self.write_file(&dst, &content)
    }

    /// Exact bytes of the file at `path`
    pub fn show(&self, path: &LogicalPath) -> Result<Vec<u8>> {
        if path.is_root() {
            return Err(PfsError::NotAFile(path.to_string()));
        }

        let (_, entry) = self
            .catalog
            .find_active(path)
            .ok_or_else(|| PfsError::NotFound(path.to_string()))?;

        if !entry.is_file() {
            return Err(PfsError::NotAFile(path.to_string()));
        }

        self.storage.read_data(entry.offset, entry.size)
    }

    /// List a file (one row) or a directory's active children
    ///
    /// The root always lists as a directory.
    pub fn ls(&self, path: &LogicalPath) -> Result<Vec<Listing>> {
        if !path.is_root() {
            let (_, entry) = self
                .catalog
                .find_active(path)
                .ok_or_else(|| PfsError::NotFound(path.to_string()))?;

            if entry.is_file() {
                return Ok(vec![Listing::from(entry)]);
            }
        }

        Ok(self.catalog.children(path).map(Listing::from).collect())
    }

    /// Create an empty directory
    pub fn mkdir(&mut self, path: &LogicalPath) -> Result<()> {
        if path.is_root() || self.catalog.find_active(path).is_some() {
            return Err(PfsError::AlreadyExists(path.to_string()));
        }
        self.check_path(path)?;
        let (parent, name) = self.require_parent_dir(path)?;

        let mut next = self.catalog.clone();
        next.push(Entry::directory(&parent, name, now_secs()));

        tracing::debug!("mkdir {}", path);
        self.commit(next, false)
    }

    /// Remove an empty directory
    pub fn rmdir(&mut self, path: &LogicalPath) -> Result<()> {
        if path.is_root() {
            return Err(PfsError::InvalidPath("cannot remove the root directory".to_string()));
        }

        let index = match self.catalog.find_active(path) {
            Some((index, entry)) if entry.is_dir() => index,
            _ => return Err(PfsError::NotFound(path.to_string())),
        };

        if self.catalog.has_active_children(path) {
            return Err(PfsError::NotEmpty(path.to_string()));
        }

        let mut next = self.catalog.clone();
        next.tombstone(index)?;

        tracing::debug!("rmdir {}", path);
        self.commit(next, true)
    }

    /// Remove a file
    ///
    /// The content stays in the data region until the next compaction.
    pub fn rm(&mut self, path: &LogicalPath) -> Result<()> {
        let index = match self.catalog.find_active(path) {
            Some((index, entry)) if entry.is_file() => index,
            _ => return Err(PfsError::NotFound(path.to_string())),
        };

        let mut next = self.catalog.clone();
        next.tombstone(index)?;

        tracing::debug!("rm {}", path);
        self.commit(next, true)
    }

    /// Write `bytes(src1) ++ bytes(src2)` to `dst`
    ///
    /// No separator is inserted. `dst` follows the same replace rules as `cp`.
    pub fn merge(&mut self, src1: &Location, src2: &Location, dst: &Location) -> Result<()> {
        let dst = self.destination(dst)?;

        let mut content = self.read_source(src1)?;
        content.extend_from_slice(&self.read_source(src2)?);

        tracing::debug!("merge {} + {} -> {} ({} bytes)", src1, src2, dst, content.len());
        self.write_file(&dst, &content)
    }

    /// Copy a stored file out to the host
    pub fn export(&self, src: &LogicalPath, dst: &Path) -> Result<()> {
        let content = match self.show(src) {
            Err(PfsError::NotAFile(_)) => return Err(PfsError::NotFound(src.to_string())),
            other => other?,
        };

        self.host.write(dst, &content)?;
        tracing::debug!("export {} -> {} ({} bytes)", src, dst.display(), content.len());
        Ok(())
    }

    /// Compact now, regardless of policy
    pub fn compact(&mut self) -> Result<CompactionStats> {
        let (compacted, stats) = compactor::compact(&mut self.storage, &self.catalog)?;
        self.catalog = compacted;
        Ok(stats)
    }

    /// Space usage of the store
    pub fn usage(&self) -> Usage {
        self.catalog.usage(self.storage.data_len())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// The catalog as last persisted
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Get the backing file path
    pub fn store_path(&self) -> &Path {
        self.storage.path()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Validate a write target and return its logical path
    fn destination(&self, dst: &Location) -> Result<LogicalPath> {
        match dst {
            Location::Supplemental(path) if !path.is_root() => {
                self.check_path(path)?;
                Ok(path.clone())
            }
            Location::Supplemental(path) => Err(PfsError::InvalidDestination(format!(
                "{} is a directory",
                path
            ))),
            Location::Host(path) => Err(PfsError::InvalidDestination(format!(
                "{} is not a supplemental path",
                path.display()
            ))),
        }
    }

    /// Full contents of a source, from the catalog or the host
    fn read_source(&self, src: &Location) -> Result<Vec<u8>> {
        match src {
            Location::Supplemental(path) => match self.catalog.find_active(path) {
                Some((_, entry)) if entry.is_file() => {
                    self.storage.read_data(entry.offset, entry.size)
                }
                _ => Err(PfsError::NotFound(src.to_string())),
            },
            Location::Host(path) => {
                if !self.config.allow_host_sources {
                    return Err(PfsError::InvalidSource(format!(
                        "host sources are disabled: {}",
                        path.display()
                    )));
                }
                self.host.read(path).map_err(|e| match e.kind() {
                    io::ErrorKind::NotFound => PfsError::NotFound(path.display().to_string()),
                    _ => PfsError::Io(e),
                })
            }
        }
    }

    /// Store `content` at `path`, replacing an existing file
    fn write_file(&mut self, path: &LogicalPath, content: &[u8]) -> Result<()> {
        let size = u32::try_from(content.len()).map_err(|_| {
            PfsError::InvalidSource(format!(
                "{} bytes exceeds the {} byte file limit",
                content.len(),
                u32::MAX
            ))
        })?;

        let (parent, name) = self.require_parent_dir(path)?;

        let mut next = self.catalog.clone();
        let replaced = match next.find_active(path) {
            Some((_, entry)) if entry.is_dir() => {
                return Err(PfsError::NotAFile(path.to_string()));
            }
            Some((index, _)) => Some(index),
            None => None,
        };
        if let Some(index) = replaced {
            next.tombstone(index)?;
        }

        let offset = self.storage.append_data(content)?;
        next.push(Entry::file(&parent, name, offset, size, now_secs()));

        self.commit(next, replaced.is_some())
    }

    /// Split `path` into parent and name, requiring an active parent directory
    fn require_parent_dir<'p>(&self, path: &'p LogicalPath) -> Result<(LogicalPath, &'p str)> {
        let (parent, name) = match (path.parent(), path.name()) {
            (Some(parent), Some(name)) => (parent, name),
            _ => return Err(PfsError::InvalidPath(path.to_string())),
        };

        if !parent.is_root() {
            match self.catalog.find_active(&parent) {
                None => return Err(PfsError::NotFound(parent.to_string())),
                Some((_, entry)) if !entry.is_dir() => {
                    return Err(PfsError::NotADirectory(parent.to_string()))
                }
                Some(_) => {}
            }
        }

        Ok((parent, name))
    }

    /// Enforce the length and depth limits before anything is written
    fn check_path(&self, path: &LogicalPath) -> Result<()> {
        path.check_len()?;
        match self.config.max_depth {
            Some(max) if path.depth() > max => Err(PfsError::InvalidPath(format!(
                "{} is nested deeper than {} levels",
                path, max
            ))),
            _ => Ok(()),
        }
    }

    /// Persist `next` and adopt it as the current catalog
    ///
    /// When the operation tombstoned something and the policy agrees, the
    /// mutation and the compaction go out in the same rewrite.
    fn commit(&mut self, next: Catalog, tombstoned: bool) -> Result<()> {
        let data_len = self.storage.data_len();

        if tombstoned && compactor::should_compact(self.config.compaction, &next, data_len) {
            let (compacted, _) = compactor::compact(&mut self.storage, &next)?;
            self.catalog = compacted;
        } else {
            self.storage.commit(&next)?;
            self.catalog = next;
        }

        Ok(())
    }
}
