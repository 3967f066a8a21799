//! Configuration for plusfs
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{PfsError, Result};

/// Main configuration for a plusfs store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Backing file holding header, catalog and data region
    pub store_path: PathBuf,

    /// Sync strategy: how often to fsync the backing file
    pub sync_strategy: SyncStrategy,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// When tombstoned space is reclaimed
    pub compaction: CompactionPolicy,

    // -------------------------------------------------------------------------
    // Namespace Configuration
    // -------------------------------------------------------------------------
    /// Maximum number of path components (None = unlimited)
    ///
    /// `Some(1)` gives a flat namespace with no subdirectories.
    pub max_depth: Option<usize>,

    /// Whether `cp`/`merge` may read sources from the host filesystem
    pub allow_host_sources: bool,
}

/// Backing file sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append and every rewrite (safest, slowest)
    EveryWrite,

    /// fsync only the rewritten image before it is swapped into place
    OnRewrite,
}

/// Compaction trigger
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompactionPolicy {
    /// Only compact when explicitly asked to
    Never,

    /// Compact after every operation that tombstones an entry
    EveryTombstone,

    /// Compact once reclaimable bytes reach this fraction of the data region
    GarbageRatio(f64),
}

impl CompactionPolicy {
    /// Parse a policy from its command-line spelling
    ///
    /// Accepts `never`, `always`, or a ratio in `0.0..=1.0`.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "never" => Ok(CompactionPolicy::Never),
            "always" => Ok(CompactionPolicy::EveryTombstone),
            other => {
                let ratio: f64 = other.parse().map_err(|_| {
                    PfsError::Config(format!("Invalid compaction policy: {}", other))
                })?;
                if !(0.0..=1.0).contains(&ratio) {
                    return Err(PfsError::Config(format!(
                        "Compaction ratio out of range: {}",
                        ratio
                    )));
                }
                Ok(CompactionPolicy::GarbageRatio(ratio))
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("private.pfs"),
            sync_strategy: SyncStrategy::OnRewrite,
            compaction: CompactionPolicy::GarbageRatio(0.5),
            max_depth: None,
            allow_host_sources: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store_path = path.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the compaction policy
    pub fn compaction(mut self, policy: CompactionPolicy) -> Self {
        self.config.compaction = policy;
        self
    }

    /// Limit path depth (number of components)
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// Allow or forbid host-filesystem sources for cp/merge
    pub fn allow_host_sources(mut self, allow: bool) -> Self {
        self.config.allow_host_sources = allow;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
