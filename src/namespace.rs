//! Namespace Resolution
//!
//! Classifies raw command tokens as supplemental (`+`-prefixed) or host
//! paths and strips the prefix before anything reaches the engine.

use std::fmt;
use std::path::PathBuf;

use crate::error::{PfsError, Result};
use crate::path::LogicalPath;

/// Marker that selects the supplemental namespace
pub const SUPPLEMENTAL_PREFIX: char = '+';

/// Where a command argument points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// A path inside the store
    Supplemental(LogicalPath),

    /// A path on the host filesystem
    Host(PathBuf),
}

impl Location {
    /// Resolve a raw token
    ///
    /// `+docs/note` → `Supplemental(/docs/note)`, `notes.txt` → `Host(notes.txt)`
    pub fn resolve(token: &str) -> Result<Self> {
        match token.strip_prefix(SUPPLEMENTAL_PREFIX) {
            Some(rest) => Ok(Location::Supplemental(LogicalPath::parse(rest)?)),
            None if token.is_empty() => Err(PfsError::InvalidPath("empty path".to_string())),
            None => Ok(Location::Host(PathBuf::from(token))),
        }
    }

    /// Resolve a token that must name a supplemental path
    pub fn supplemental(token: &str) -> Result<LogicalPath> {
        match Self::resolve(token)? {
            Location::Supplemental(path) => Ok(path),
            Location::Host(_) => Err(PfsError::InvalidPath(format!(
                "'{}' is not a supplemental path (missing '{}')",
                token, SUPPLEMENTAL_PREFIX
            ))),
        }
    }

    /// Whether this location is inside the store
    pub fn is_supplemental(&self) -> bool {
        matches!(self, Location::Supplemental(_))
    }
}

impl From<LogicalPath> for Location {
    fn from(path: LogicalPath) -> Self {
        Location::Supplemental(path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Supplemental(path) => write!(f, "{}{}", SUPPLEMENTAL_PREFIX, path),
            Location::Host(path) => write!(f, "{}", path.display()),
        }
    }
}
