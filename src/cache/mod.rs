//! Cache Module
//!
//! Read-only access to the indexed cache the server streams from.
//!
//! ## Responsibilities
//! - Map (index, entry) pairs to stored containers
//! - Trim containers to their declared length
//! - Decompress containers and decode reference tables
//!
//! ## Container Format
//! ```text
//! ┌──────────┬──────────┬────────────────────┬─────────────────────┐
//! │ Comp (1) │ Len (4)  │ Uncompressed Len   │       Payload       │
//! │          │          │ (4, if Comp != 0)  │                     │
//! └──────────┴──────────┴────────────────────┴─────────────────────┘
//! ```
//! Stored buffers may carry trailing bytes (version trailer, sector slack)
//! past `header + Len`; they are never sent to clients.

mod container;
mod disk;
mod memory;
mod reference_table;

pub use container::{
    decompress, header_len, trim, trimmed_len, Compression, COMPRESSED_HEADER_LEN, PLAIN_HEADER_LEN,
};
pub use disk::DiskStore;
pub use memory::MemoryStore;
pub use reference_table::ReferenceTable;

use crate::error::Result;

/// Index holding one reference table per real index
pub const META_INDEX: u8 = 255;

/// Opaque handle to an entry that is known to be in range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryRef {
    index: u8,
    entry: u32,
}

impl EntryRef {
    pub(crate) fn new(index: u8, entry: u32) -> Self {
        Self { index, entry }
    }

    /// Index the entry belongs to
    pub fn index(&self) -> u8 {
        self.index
    }

    /// Entry id within its index
    pub fn entry(&self) -> u32 {
        self.entry
    }
}

/// Storage engine consumed by the protocol layer
///
/// Implementations must allow concurrent reads from many connections.
pub trait CacheStore: Send + Sync {
    /// Number of real (non-meta) indices
    fn index_count(&self) -> usize;

    /// Number of entry slots in `index` (0 if the index does not exist)
    fn entry_count(&self, index: u8) -> usize;

    /// Raw stored container, possibly longer than its declared length
    fn read_raw(&self, entry: EntryRef) -> Result<Vec<u8>>;

    /// Resolve (index, entry) to a reference, `None` when out of range
    fn entry(&self, index: u8, entry: u32) -> Option<EntryRef> {
        if (entry as usize) < self.entry_count(index) {
            Some(EntryRef::new(index, entry))
        } else {
            None
        }
    }

    /// Decompressed container payload
    fn read_decompressed(&self, entry: EntryRef) -> Result<Vec<u8>> {
        let raw = self.read_raw(entry)?;
        decompress(&raw)
    }
}
