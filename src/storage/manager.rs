//! Storage Manager
//!
//! Owns the backing file and coordinates reads and writes.
//!
//! ## Responsibilities
//! - Create a minimal empty store when none exists
//! - Validate the header and load the catalog
//! - Append content bytes at the end of the data region
//! - Swap in complete new images atomically (write temp file, fsync, rename)

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::catalog::Catalog;
use crate::config::SyncStrategy;
use crate::error::{PfsError, Result};

use super::codec::{self, HEADER_SIZE};

/// Manages the backing file
///
/// The file is reopened per operation rather than held open, so a rename
/// during `rewrite` never leaves a stale handle behind.
pub struct StorageManager {
    /// Backing file path
    path: PathBuf,

    /// Offset of the first data-region byte (header + metadata table)
    data_start: u64,

    /// Length of the data region
    data_len: u64,

    /// When to fsync
    sync_strategy: SyncStrategy,
}

impl StorageManager {
    /// Open the store at `path`, creating an empty one if absent
    ///
    /// An existing file is only read here: its header is validated and the
    /// region boundaries are computed, nothing is written.
    pub fn open_or_create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            write_image(path, &Catalog::new(), &[])?;
            tracing::info!("Created empty store at {}", path.display());
        }

        let mut file = File::open(path)?;
        let file_len = file.metadata()?.len();

        let mut header_bytes = [0u8; HEADER_SIZE];
        let read = read_up_to(&mut file, &mut header_bytes)?;
        let header = codec::decode_header(&header_bytes[..read]).map_err(|e| {
            tracing::warn!("Rejecting store {}: {}", path.display(), e);
            e
        })?;

        let data_start = header.data_start();
        if file_len < data_start {
            let err = PfsError::CorruptStore(format!(
                "File is {} bytes but metadata ends at {}",
                file_len, data_start
            ));
            tracing::warn!("Rejecting store {}: {}", path.display(), err);
            return Err(err);
        }

        Ok(Self {
            path: path.to_path_buf(),
            data_start,
            data_len: file_len - data_start,
            sync_strategy,
        })
    }

    /// Read and validate the catalog
    ///
    /// Fails with `CorruptStore` if the metadata does not parse or violates
    /// a catalog invariant against the current data region.
    pub fn load(&self) -> Result<Catalog> {
        let mut file = File::open(&self.path)?;
        let mut head = vec![0u8; self.data_start as usize];
        file.read_exact(&mut head)?;

        let loaded = codec::decode_image(&head).and_then(|(catalog, data_start)| {
            if data_start != self.data_start {
                return Err(PfsError::CorruptStore(
                    "Header changed since open".to_string(),
                ));
            }
            catalog.validate(self.data_len)?;
            Ok(catalog)
        });

        match loaded {
            Ok(catalog) => {
                tracing::debug!(
                    "Loaded {} entries, data region {} bytes",
                    catalog.len(),
                    self.data_len
                );
                Ok(catalog)
            }
            Err(e) => {
                tracing::warn!("Rejecting store {}: {}", self.path.display(), e);
                Err(e)
            }
        }
    }

    /// Append bytes at the end of the data region
    ///
    /// Returns the data-region offset where the bytes begin. The bytes stay
    /// unreferenced until a catalog pointing at them is rewritten.
    pub fn append_data(&mut self, bytes: &[u8]) -> Result<u64> {
        let offset = self.data_len;

        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(self.data_start + offset))?;
        file.write_all(bytes)?;
        if self.sync_strategy == SyncStrategy::EveryWrite {
            file.sync_data()?;
        }

        self.data_len += bytes.len() as u64;
        tracing::trace!("Appended {} bytes at offset {}", bytes.len(), offset);

        Ok(offset)
    }

    /// Read `size` bytes at data-region `offset`
    pub fn read_data(&self, offset: u64, size: u32) -> Result<Vec<u8>> {
        let end = offset + size as u64;
        if end > self.data_len {
            return Err(PfsError::CorruptStore(format!(
                "Range {}..{} outside data region of {} bytes",
                offset, end, self.data_len
            )));
        }

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.data_start + offset))?;

        let mut bytes = vec![0u8; size as usize];
        file.read_exact(&mut bytes)?;
        Ok(bytes)
    }

    /// Read the entire data region
    pub fn read_region(&self) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.data_start))?;

        let mut region = vec![0u8; self.data_len as usize];
        file.read_exact(&mut region)?;
        Ok(region)
    }

    /// Replace the store with `catalog` over the data region `data`
    ///
    /// The new image is written to a temporary file next to the store,
    /// synced, then renamed over it with the store's permissions; the
    /// directory is synced after the rename. On error the previous file is
    /// intact.
    pub fn rewrite(&mut self, catalog: &Catalog, data: &[u8]) -> Result<()> {
        catalog.validate(data.len() as u64)?;

        let data_start = write_image(&self.path, catalog, data)?;
        self.data_start = data_start;
        self.data_len = data.len() as u64;

        tracing::debug!(
            "Rewrote store: {} entries, data region {} bytes",
            catalog.len(),
            self.data_len
        );
        Ok(())
    }

    /// Rewrite with `catalog`, keeping the current data region as is
    pub fn commit(&mut self, catalog: &Catalog) -> Result<()> {
        let region = self.read_region()?;
        self.rewrite(catalog, &region)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Length of the data region
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    /// Offset of the data region within the file
    pub fn data_start(&self) -> u64 {
        self.data_start
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

/// Atomically write header + metadata + data to `path`
///
/// Returns the data-region start of the new image.
fn write_image(path: &Path, catalog: &Catalog, data: &[u8]) -> Result<u64> {
    let image = codec::encode_image(catalog)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let file = tmp.as_file_mut();
        file.write_all(&image)?;
        file.write_all(data)?;

        // The replacement keeps the store's existing mode
        if let Ok(metadata) = fs::metadata(path) {
            file.set_permissions(metadata.permissions())?;
        }
        file.sync_all()?;
    }
    tmp.persist(path).map_err(|e| PfsError::Io(e.error))?;
    sync_dir(dir)?;

    Ok(image.len() as u64)
}

/// Make a rename inside `dir` durable
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

/// Fill as much of `buf` as the file allows
fn read_up_to(file: &mut File, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
