//! Memory Store
//!
//! A `CacheStore` that keeps every container in a map. Used by tests and
//! by tooling that assembles caches on the fly.

use std::collections::HashMap;

use crate::error::{Js5Error, Result};

use super::{CacheStore, EntryRef, META_INDEX};

/// In-memory cache store
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<(u8, u32), Vec<u8>>,
    entry_counts: HashMap<u8, usize>,
    index_count: usize,
}

impl MemoryStore {
    /// Create an empty store with `index_count` real indices
    pub fn new(index_count: usize) -> Self {
        Self {
            index_count,
            ..Self::default()
        }
    }

    /// Store a raw container at (index, entry)
    pub fn insert(&mut self, index: u8, entry: u32, raw: Vec<u8>) {
        let count = self.entry_counts.entry(index).or_insert(0);
        *count = (*count).max(entry as usize + 1);
        self.entries.insert((index, entry), raw);
    }

    /// Builder-style insert
    pub fn with_entry(mut self, index: u8, entry: u32, raw: Vec<u8>) -> Self {
        self.insert(index, entry, raw);
        self
    }

    fn is_known_index(&self, index: u8) -> bool {
        index == META_INDEX || (index as usize) < self.index_count
    }
}

impl CacheStore for MemoryStore {
    fn index_count(&self) -> usize {
        self.index_count
    }

    fn entry_count(&self, index: u8) -> usize {
        if !self.is_known_index(index) {
            return 0;
        }
        self.entry_counts.get(&index).copied().unwrap_or(0)
    }

    fn read_raw(&self, entry: EntryRef) -> Result<Vec<u8>> {
        self.entries
            .get(&(entry.index(), entry.entry()))
            .cloned()
            .ok_or(Js5Error::EntryNotFound {
                index: entry.index(),
                entry: entry.entry(),
            })
    }
}
