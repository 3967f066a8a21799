//! Storage codec
//!
//! Encoding and decoding of the header and metadata table.
//!
//! ## Header Format
//! ```text
//! ┌──────────┬─────────┬─────────────┬─────────────┐
//! │Magic (4) │ Ver (1) │ MetaLen (4) │ MetaCRC (4) │
//! └──────────┴─────────┴─────────────┴─────────────┘
//! ```
//!
//! ## Metadata Table Format
//! ```text
//! ┌────────────────┬──────────────┬────────────────────┬─────
//! │ EntryCount (4) │ RecLen (4)   │ Record (RecLen)    │ ...
//! └────────────────┴──────────────┴────────────────────┴─────
//! ```
//! Records are bincode-encoded [`Entry`] values (fixed-width integers,
//! little-endian). All integers in the framing are little-endian.

use bincode::Options;
use bytes::{Buf, BufMut, BytesMut};

use crate::catalog::{Catalog, Entry};
use crate::error::{PfsError, Result};

/// Magic bytes identifying a plusfs store
pub const MAGIC: &[u8; 4] = b"PLFS";

/// Current store format version
pub const VERSION: u8 = 1;

/// Header size: Magic (4) + Version (1) + MetaLen (4) + MetaCRC (4) = 13 bytes
pub const HEADER_SIZE: usize = 13;

/// Upper bound for a single encoded record
pub const MAX_RECORD_SIZE: u32 = 64 * 1024;

/// Validated store header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    /// Length of the metadata table that follows the header
    pub meta_len: u32,
    /// CRC32 of the metadata table
    pub meta_crc: u32,
}

impl Header {
    /// Offset where the data region begins
    pub fn data_start(&self) -> u64 {
        HEADER_SIZE as u64 + self.meta_len as u64
    }
}

fn record_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
        .with_limit(MAX_RECORD_SIZE as u64)
        .reject_trailing_bytes()
}

// =============================================================================
// Header Encoding/Decoding
// =============================================================================

/// Encode a header describing `metadata`
pub fn encode_header(metadata: &[u8]) -> Result<[u8; HEADER_SIZE]> {
    let meta_len = u32::try_from(metadata.len()).map_err(|_| {
        PfsError::Serialization(format!(
            "Metadata table too large: {} bytes",
            metadata.len()
        ))
    })?;

    let mut header = [0u8; HEADER_SIZE];
    let mut buf = &mut header[..];
    buf.put_slice(MAGIC);
    buf.put_u8(VERSION);
    buf.put_u32_le(meta_len);
    buf.put_u32_le(crc32fast::hash(metadata));

    Ok(header)
}

/// Decode and validate a header
pub fn decode_header(bytes: &[u8]) -> Result<Header> {
    if bytes.len() < HEADER_SIZE {
        return Err(PfsError::CorruptStore(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let magic = &bytes[..MAGIC.len()];
    if magic != MAGIC {
        return Err(PfsError::CorruptStore(format!(
            "Invalid magic: expected {:?}, got {:?}",
            MAGIC, magic
        )));
    }

    let mut buf = &bytes[MAGIC.len()..HEADER_SIZE];
    let version = buf.get_u8();
    if version != VERSION {
        return Err(PfsError::CorruptStore(format!(
            "Unsupported store version: {}",
            version
        )));
    }

    let meta_len = buf.get_u32_le();
    let meta_crc = buf.get_u32_le();

    Ok(Header {
        version,
        meta_len,
        meta_crc,
    })
}

// =============================================================================
// Metadata Encoding/Decoding
// =============================================================================

/// Encode a catalog as a metadata table
pub fn encode_metadata(catalog: &Catalog) -> Result<Vec<u8>> {
    let count = u32::try_from(catalog.len())
        .map_err(|_| PfsError::Serialization("Too many catalog entries".to_string()))?;

    let mut buf = BytesMut::with_capacity(4 + catalog.len() * 64);
    buf.put_u32_le(count);

    for entry in catalog.iter() {
        let record = record_options()
            .serialize(entry)
            .map_err(|e| PfsError::Serialization(format!("{}: {}", entry.name, e)))?;

        buf.put_u32_le(record.len() as u32);
        buf.put_slice(&record);
    }

    Ok(buf.to_vec())
}

/// Decode a metadata table
///
/// Every record must decode exactly and the table must end after the last
/// record: a short or garbled record is an error, never skipped.
pub fn decode_metadata(bytes: &[u8]) -> Result<Catalog> {
    let mut buf = bytes;

    if buf.remaining() < 4 {
        return Err(PfsError::CorruptStore(
            "Metadata table: missing entry count".to_string(),
        ));
    }
    let count = buf.get_u32_le() as usize;

    // Each record needs at least its length prefix
    let mut entries = Vec::with_capacity(count.min(buf.remaining() / 4));

    for index in 0..count {
        if buf.remaining() < 4 {
            return Err(PfsError::CorruptStore(format!(
                "Record {}: missing length",
                index
            )));
        }
        let record_len = buf.get_u32_le();

        if record_len > MAX_RECORD_SIZE {
            return Err(PfsError::CorruptStore(format!(
                "Record {}: length {} exceeds limit {}",
                index, record_len, MAX_RECORD_SIZE
            )));
        }
        let record_len = record_len as usize;

        if buf.remaining() < record_len {
            return Err(PfsError::CorruptStore(format!(
                "Record {}: truncated (expected {} bytes, got {})",
                index,
                record_len,
                buf.remaining()
            )));
        }

        let entry: Entry = record_options()
            .deserialize(&buf[..record_len])
            .map_err(|e| PfsError::CorruptStore(format!("Record {}: {}", index, e)))?;
        buf.advance(record_len);

        entries.push(entry);
    }

    if buf.has_remaining() {
        return Err(PfsError::CorruptStore(format!(
            "Metadata table: {} trailing bytes after {} records",
            buf.remaining(),
            count
        )));
    }

    Ok(Catalog::from_entries(entries))
}

// =============================================================================
// Image Encoding/Decoding
// =============================================================================

/// Encode header + metadata table (everything before the data region)
pub fn encode_image(catalog: &Catalog) -> Result<Vec<u8>> {
    let metadata = encode_metadata(catalog)?;
    let header = encode_header(&metadata)?;

    let mut image = Vec::with_capacity(HEADER_SIZE + metadata.len());
    image.extend_from_slice(&header);
    image.extend_from_slice(&metadata);
    Ok(image)
}

/// Decode header + metadata table from the front of `bytes`
///
/// Returns the catalog and the offset where the data region begins.
/// Anything after the metadata table is treated as data region.
pub fn decode_image(bytes: &[u8]) -> Result<(Catalog, u64)> {
    let header = decode_header(bytes)?;
    let meta_end = HEADER_SIZE + header.meta_len as usize;

    if bytes.len() < meta_end {
        return Err(PfsError::CorruptStore(format!(
            "Truncated metadata table: expected {} bytes, got {}",
            header.meta_len,
            bytes.len() - HEADER_SIZE
        )));
    }

    let metadata = &bytes[HEADER_SIZE..meta_end];
    let crc = crc32fast::hash(metadata);
    if crc != header.meta_crc {
        return Err(PfsError::CorruptStore(format!(
            "Metadata checksum mismatch: stored {:08x}, computed {:08x}",
            header.meta_crc, crc
        )));
    }

    let catalog = decode_metadata(metadata)?;
    Ok((catalog, header.data_start()))
}
