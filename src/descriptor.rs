//! Global Descriptor
//!
//! The synthetic container answering the reserved (255, 255) request: one
//! checksum/revision pair per real index.
//!
//! ## Layout
//! ```text
//! ┌──────────┬───────────────┬─────────────────────────────────┐
//! │ Comp (1) │ Size (4)      │ (CRC32 (4), Revision (4)) × N   │
//! │   = 0    │   = N * 8     │                                 │
//! └──────────┴───────────────┴─────────────────────────────────┘
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::cache::{self, CacheStore, ReferenceTable, META_INDEX, PLAIN_HEADER_LEN};
use crate::error::{Js5Error, Result};

/// Bytes per index in the descriptor body
pub const ENTRY_SIZE: usize = 8;

/// Checksum and revision of one index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorEntry {
    /// IEEE CRC32 of the raw reference table container
    pub crc: u32,

    /// Revision from the decoded reference table
    pub revision: u32,
}

/// Immutable descriptor shared by every connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalDescriptor {
    bytes: Bytes,
}

impl GlobalDescriptor {
    /// Build the descriptor from the store's reference tables
    ///
    /// Indices are visited in order 0..index_count. Any missing or
    /// undecodable reference table fails the build.
    pub fn build(store: &dyn CacheStore) -> Result<Self> {
        let index_count = store.index_count();
        if index_count > META_INDEX as usize {
            return Err(Js5Error::Descriptor(format!(
                "Too many indices: {}",
                index_count
            )));
        }

        let mut entries = Vec::with_capacity(index_count);

        for index in 0..index_count {
            // Reference table for index N lives at META_INDEX/N
            let entry = store.entry(META_INDEX, index as u32).ok_or_else(|| {
                Js5Error::Descriptor(format!("No reference table for index {}", index))
            })?;

            let raw = store.read_raw(entry).map_err(|e| {
                Js5Error::Descriptor(format!("Reading reference table {}: {}", index, e))
            })?;
            let data = cache::decompress(&raw).map_err(|e| {
                Js5Error::Descriptor(format!("Decompressing reference table {}: {}", index, e))
            })?;
            let table = ReferenceTable::decode(&data).map_err(|e| {
                Js5Error::Descriptor(format!("Decoding reference table {}: {}", index, e))
            })?;

            // Checksum covers the stored bytes, trailer included
            let crc = crc32fast::hash(&raw);
            tracing::debug!(
                "Index {}: crc={:08x} revision={} entries={}",
                index,
                crc,
                table.revision,
                table.entry_count
            );

            entries.push(DescriptorEntry {
                crc,
                revision: table.revision,
            });
        }

        Self::from_entries(&entries)
    }

    /// Encode a descriptor from explicit entries
    pub fn from_entries(entries: &[DescriptorEntry]) -> Result<Self> {
        let body_len = entries.len() * ENTRY_SIZE;
        let mut buf = BytesMut::with_capacity(PLAIN_HEADER_LEN + body_len);

        buf.put_u8(0);
        buf.put_u32(body_len as u32);
        for entry in entries {
            buf.put_u32(entry.crc);
            buf.put_u32(entry.revision);
        }

        let bytes = buf.freeze();

        // Must pass through the trimmer unchanged
        let len = cache::trimmed_len(&bytes)?;
        if len != bytes.len() {
            return Err(Js5Error::Descriptor(format!(
                "Declared size {} does not match encoded size {}",
                len,
                bytes.len()
            )));
        }

        Ok(Self { bytes })
    }

    /// Decode a descriptor received from a server
    pub fn parse(container: &[u8]) -> Result<Self> {
        let trimmed = cache::trim(container)?;
        if trimmed[0] != 0 {
            return Err(Js5Error::Descriptor(format!(
                "Descriptor must be uncompressed, got compression {}",
                trimmed[0]
            )));
        }
        if (trimmed.len() - PLAIN_HEADER_LEN) % ENTRY_SIZE != 0 {
            return Err(Js5Error::Descriptor(format!(
                "Body of {} bytes is not a whole number of entries",
                trimmed.len() - PLAIN_HEADER_LEN
            )));
        }
        Ok(Self {
            bytes: Bytes::copy_from_slice(trimmed),
        })
    }

    /// The trimmed container, ready for framing
    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Number of indices described
    pub fn index_count(&self) -> usize {
        (self.bytes.len() - PLAIN_HEADER_LEN) / ENTRY_SIZE
    }

    /// Per-index entries in index order
    pub fn entries(&self) -> impl Iterator<Item = DescriptorEntry> + '_ {
        self.bytes[PLAIN_HEADER_LEN..]
            .chunks_exact(ENTRY_SIZE)
            .map(|c| DescriptorEntry {
                crc: u32::from_be_bytes([c[0], c[1], c[2], c[3]]),
                revision: u32::from_be_bytes([c[4], c[5], c[6], c[7]]),
            })
    }
}
