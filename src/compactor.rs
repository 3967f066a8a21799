//! Compactor
//!
//! Reclaims space held by tombstoned entries and orphaned appends.
//!
//! Surviving entries keep their catalog order; file contents are laid out
//! back to back in that order, so the rewritten data region has no gaps.
//! This is the only place an active entry's offset ever changes.

use crate::catalog::{Catalog, Entry};
use crate::config::CompactionPolicy;
use crate::error::{PfsError, Result};
use crate::storage::StorageManager;

/// Outcome of a compaction pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompactionStats {
    /// Tombstoned entries dropped from the catalog
    pub entries_purged: usize,

    /// Data-region bytes reclaimed
    pub bytes_reclaimed: u64,

    /// Data-region length after compaction
    pub data_len: u64,
}

/// A dense catalog and the data region it addresses
#[derive(Debug)]
pub struct Compaction {
    pub catalog: Catalog,
    pub data: Vec<u8>,
    pub stats: CompactionStats,
}

/// Whether `policy` asks for a compaction of `catalog` over `data_len` bytes
pub fn should_compact(policy: CompactionPolicy, catalog: &Catalog, data_len: u64) -> bool {
    match policy {
        CompactionPolicy::Never => false,
        CompactionPolicy::EveryTombstone => true,
        CompactionPolicy::GarbageRatio(ratio) => {
            let usage = catalog.usage(data_len);
            (usage.tombstones > 0 || usage.garbage_bytes() > 0) && usage.garbage_ratio() >= ratio
        }
    }
}

/// Build the compacted catalog and data region without writing anything
pub fn plan(storage: &StorageManager, catalog: &Catalog) -> Result<Compaction> {
    let region = storage.read_region()?;
    let usage = catalog.usage(region.len() as u64);

    let mut entries: Vec<Entry> = Vec::with_capacity(usage.active_entries);
    let mut data: Vec<u8> = Vec::with_capacity(usage.live_bytes as usize);
    let mut entries_purged = 0;

    for entry in catalog.iter() {
        if !entry.is_active() {
            entries_purged += 1;
            continue;
        }

        let mut survivor = entry.clone();
        if entry.is_file() {
            let start = entry.offset as usize;
            let end = entry.end() as usize;
            let bytes = region.get(start..end).ok_or_else(|| {
                PfsError::CorruptStore(format!(
                    "{} points past the data region ({}..{} of {})",
                    entry.name,
                    start,
                    end,
                    region.len()
                ))
            })?;

            survivor.offset = data.len() as u64;
            data.extend_from_slice(bytes);
        }
        entries.push(survivor);
    }

    let stats = CompactionStats {
        entries_purged,
        bytes_reclaimed: (region.len() as u64).saturating_sub(data.len() as u64),
        data_len: data.len() as u64,
    };

    Ok(Compaction {
        catalog: Catalog::from_entries(entries),
        data,
        stats,
    })
}

/// Compact `catalog` and rewrite the store with the dense result
///
/// Returns the catalog now on disk. If the rewrite fails the store still
/// holds its previous image.
pub fn compact(storage: &mut StorageManager, catalog: &Catalog) -> Result<(Catalog, CompactionStats)> {
    let Compaction {
        catalog: compacted,
        data,
        stats,
    } = plan(storage, catalog)?;

    storage.rewrite(&compacted, &data)?;

    tracing::info!(
        "Compacted store: purged {} entries, reclaimed {} bytes, data region now {} bytes",
        stats.entries_purged,
        stats.bytes_reclaimed,
        stats.data_len
    );

    Ok((compacted, stats))
}
