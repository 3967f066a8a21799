//! Host Byte I/O
//!
//! Read/write access to host-filesystem files named as non-supplemental
//! sources (`cp`, `merge`) or export destinations. The engine only sees the
//! [`HostIo`] trait, so callers can route host access elsewhere.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Byte-level access to files outside the store
pub trait HostIo: Send {
    /// Read the full contents of a host file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate a host file with `bytes`
    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

impl<T: HostIo + Sync> HostIo for Arc<T> {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        (**self).write(path, bytes)
    }
}

/// Host I/O backed by the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalHost;

impl HostIo for LocalHost {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(path, bytes)
    }
}

/// In-memory host, for embedding without touching real files
#[derive(Debug, Default)]
pub struct MemoryHost {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file
    pub fn insert(&self, path: impl Into<PathBuf>, bytes: impl Into<Vec<u8>>) {
        self.lock().insert(path.into(), bytes.into());
    }

    /// Contents of a file, if present
    pub fn get(&self, path: &Path) -> Option<Vec<u8>> {
        self.lock().get(path).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PathBuf, Vec<u8>>> {
        // A poisoned map is still consistent: every write is a single insert.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HostIo for MemoryHost {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.lock().get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: no such file", path.display()),
            )
        })
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.lock().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }
}
