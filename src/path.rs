//! Logical Paths
//!
//! Normalized paths inside the supplemental namespace. A path is a list of
//! non-empty components rendered as `/a/b`; the root renders as `/`.
//! The `+` marker is not part of a `LogicalPath` (see [`crate::namespace`]).

use std::fmt;

use crate::error::{PfsError, Result};

/// Separator between path components
pub const SEPARATOR: char = '/';

/// Longest accepted rendered path, in bytes
///
/// Keeps every catalog record (name + parent path) well inside
/// [`crate::storage::codec::MAX_RECORD_SIZE`].
pub const MAX_PATH_LEN: usize = 4096;

/// A normalized path inside the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LogicalPath {
    components: Vec<String>,
}

impl LogicalPath {
    /// The root directory
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse and normalize a raw path
    ///
    /// Leading, trailing and repeated separators are ignored, as are `.`
    /// components. `..` is rejected: paths never escape the root.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut components = Vec::new();

        for part in raw.split(SEPARATOR) {
            match part {
                "" | "." => continue,
                ".." => {
                    return Err(PfsError::InvalidPath(format!(
                        "'..' is not allowed: {}",
                        raw
                    )))
                }
                name if name.contains('\0') => {
                    return Err(PfsError::InvalidPath(format!(
                        "NUL byte in path: {:?}",
                        raw
                    )))
                }
                name => components.push(name.to_string()),
            }
        }

        let path = Self { components };
        path.check_len()?;
        Ok(path)
    }

    /// Fail with `InvalidPath` if the rendered path exceeds [`MAX_PATH_LEN`]
    pub fn check_len(&self) -> Result<()> {
        let len = self.rendered_len();
        if len > MAX_PATH_LEN {
            return Err(PfsError::InvalidPath(format!(
                "path is {} bytes, limit is {}",
                len, MAX_PATH_LEN
            )));
        }
        Ok(())
    }

    /// Length of the `/`-rendered form
    pub fn rendered_len(&self) -> usize {
        if self.is_root() {
            return 1;
        }
        self.components.iter().map(|c| c.len() + 1).sum()
    }

    /// Build a path from an entry's stored parent path and name
    pub fn from_parts(parent: &str, name: &str) -> Result<Self> {
        let parent = Self::parse(parent)?;
        Ok(parent.join(name))
    }

    /// Whether this is the root directory
    pub fn is_root(&self) -> bool {
        self.components.is_empty()
    }

    /// Number of components (root = 0)
    pub fn depth(&self) -> usize {
        self.components.len()
    }

    /// Final component, None for the root
    pub fn name(&self) -> Option<&str> {
        self.components.last().map(|s| s.as_str())
    }

    /// Parent directory, None for the root
    pub fn parent(&self) -> Option<LogicalPath> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            components: self.components[..self.components.len() - 1].to_vec(),
        })
    }

    /// Append a single component
    pub fn join(&self, name: &str) -> LogicalPath {
        let mut components = self.components.clone();
        components.push(name.to_string());
        Self { components }
    }

    /// Iterate over components
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.components.iter().map(|s| s.as_str())
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for component in &self.components {
            write!(f, "{}{}", SEPARATOR, component)?;
        }
        Ok(())
    }
}
