//! Shared fixtures for js5d tests
//!
//! Builds containers, reference tables and on-disk caches.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use js5d::cache::{CacheStore, DiskStore, MemoryStore, META_INDEX};
use js5d::{Config, Engine};

pub const REVISION: u32 = 181;

// =============================================================================
// Containers
// =============================================================================

/// Uncompressed container: tag 0, length, payload
pub fn plain_container(payload: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8];
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Gzip container: tag 2, compressed length, uncompressed length, body
pub fn gzip_container(payload: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(payload).unwrap();
    let body = encoder.finish().unwrap();
    compressed_container(2, &body, payload.len())
}

/// Bzip2 container: tag 1, with the "BZh1" magic stripped from the body
pub fn bzip2_container(payload: &[u8]) -> Vec<u8> {
    let mut encoder = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::new(1));
    encoder.write_all(payload).unwrap();
    let stream = encoder.finish().unwrap();
    assert_eq!(&stream[..4], b"BZh1");
    compressed_container(1, &stream[4..], payload.len())
}

fn compressed_container(tag: u8, body: &[u8], uncompressed: usize) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&(uncompressed as u32).to_be_bytes());
    out.extend_from_slice(body);
    out
}

/// Append the 2-byte version trailer stored after most containers
pub fn with_trailer(mut container: Vec<u8>, version: u16) -> Vec<u8> {
    container.extend_from_slice(&version.to_be_bytes());
    container
}

/// Deterministic payload bytes that never contain 0xFF
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Fixed-seed LCG bytes; compressors cannot shrink these
pub fn noise(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x2545_F491;
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect()
}

// =============================================================================
// Reference Tables
// =============================================================================

/// Minimal reference table: format, revision (format >= 6), flags, count
pub fn reference_table(format: u8, revision: u32, entry_count: u16) -> Vec<u8> {
    let mut out = vec![format];
    if format >= 6 {
        out.extend_from_slice(&revision.to_be_bytes());
    }
    out.push(0);
    out.extend_from_slice(&entry_count.to_be_bytes());
    out
}

/// Meta-index container for an index with the given revision
pub fn table_container(revision: u32) -> Vec<u8> {
    gzip_container(&reference_table(6, revision, 3))
}

// =============================================================================
// Stores
// =============================================================================

/// Store with `index_count` indices, revision 1000 + index, and three
/// entries per index with version trailers
pub fn sample_store(index_count: u8) -> MemoryStore {
    let mut store = MemoryStore::new(index_count as usize);
    for index in 0..index_count {
        store.insert(META_INDEX, index as u32, table_container(1000 + index as u32));
        for entry in 0..3u32 {
            let data = payload(100 * (entry as usize + 1) + index as usize);
            store.insert(index, entry, with_trailer(plain_container(&data), 7));
        }
    }
    store
}

pub fn test_config() -> Config {
    Config::builder().revision(REVISION).build()
}

pub fn engine_with(store: impl CacheStore + 'static, config: Config) -> Engine {
    Engine::with_store(config, Arc::new(store)).unwrap()
}

pub fn sample_engine() -> Engine {
    engine_with(sample_store(4), test_config())
}

// =============================================================================
// On-disk caches
// =============================================================================

const SECTOR_SIZE: usize = 520;

fn u24(value: usize) -> [u8; 3] {
    [(value >> 16) as u8, (value >> 8) as u8, value as u8]
}

/// Write a `.dat2` / `.idx` cache holding `entries` as (index, entry, raw)
///
/// Sectors are allocated sequentially from sector 1. Index files exist for
/// 0..index_count and 255 even when empty.
pub fn write_disk_cache(dir: &Path, index_count: u8, entries: &[(u8, u32, Vec<u8>)]) {
    let mut data = vec![0u8; SECTOR_SIZE];
    let mut indices: BTreeMap<u8, Vec<u8>> = (0..index_count).map(|i| (i, Vec::new())).collect();
    indices.insert(META_INDEX, Vec::new());

    for (index, entry, bytes) in entries {
        let extended = *entry > 0xFFFF;
        let capacity = if extended { 510 } else { 512 };
        let first_sector = data.len() / SECTOR_SIZE;

        let pointers = indices.entry(*index).or_default();
        let offset = *entry as usize * 6;
        if pointers.len() < offset + 6 {
            pointers.resize(offset + 6, 0);
        }
        pointers[offset..offset + 3].copy_from_slice(&u24(bytes.len()));
        pointers[offset + 3..offset + 6].copy_from_slice(&u24(first_sector));

        let chunks: Vec<&[u8]> = bytes.chunks(capacity).collect();
        for (chunk, part) in chunks.iter().enumerate() {
            let sector = data.len() / SECTOR_SIZE;
            let next = if chunk + 1 < chunks.len() { sector + 1 } else { 0 };

            let mut buf = Vec::with_capacity(SECTOR_SIZE);
            if extended {
                buf.extend_from_slice(&entry.to_be_bytes());
            } else {
                buf.extend_from_slice(&(*entry as u16).to_be_bytes());
            }
            buf.extend_from_slice(&(chunk as u16).to_be_bytes());
            buf.extend_from_slice(&u24(next));
            buf.push(*index);
            buf.extend_from_slice(part);
            buf.resize(SECTOR_SIZE, 0);
            data.extend_from_slice(&buf);
        }
    }

    std::fs::write(dir.join("main_file_cache.dat2"), &data).unwrap();
    for (index, pointers) in indices {
        std::fs::write(DiskStore::index_path(dir, index), &pointers).unwrap();
    }
}

/// Sample disk cache: reference tables for every index plus a few entries,
/// including one spanning several sectors
pub fn write_sample_disk_cache(dir: &Path, index_count: u8) -> Vec<(u8, u32, Vec<u8>)> {
    let mut entries = Vec::new();
    for index in 0..index_count {
        entries.push((META_INDEX, index as u32, table_container(500 + index as u32)));
    }
    entries.push((0, 0, with_trailer(plain_container(&payload(10)), 1)));
    entries.push((0, 1, with_trailer(plain_container(&payload(2000)), 1)));
    entries.push((1, 5, with_trailer(gzip_container(&noise(3000)), 2)));
    write_disk_cache(dir, index_count, &entries);
    entries
}
