//! Tests for Engine
//!
//! These tests verify:
//! - Configuration validation at startup
//! - Descriptor answers for (255, 255)
//! - Trimmed entries for regular requests
//! - Per-request failures (missing, truncated)

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{
    payload, plain_container, sample_engine, sample_store, test_config, with_trailer,
    write_sample_disk_cache, REVISION,
};
use js5d::cache::{CacheStore, MemoryStore, META_INDEX};
use js5d::protocol::{FileRequest, Priority};
use js5d::{Config, Engine, Js5Error};
use tempfile::TempDir;

fn urgent(index: u8, entry: u16) -> FileRequest {
    FileRequest::new(index, entry, Priority::Urgent)
}

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_config_defaults() {
    let config = Config::default();
    assert_eq!(config.listen_addr, "127.0.0.1:43594");
    assert_eq!(config.revision, 0);
    assert_eq!(config.read_timeout_ms, 0);
    assert_eq!(config.write_timeout_ms, 0);
    assert!(!config.strict_handshake);
}

#[test]
fn test_zero_revision_is_rejected() {
    let config = Config::builder().revision(0).build();
    assert!(matches!(config.validate(), Err(Js5Error::Config(_))));

    let result = Engine::with_store(config, Arc::new(sample_store(1)));
    assert!(matches!(result, Err(Js5Error::Config(_))));
}

#[test]
fn test_empty_listen_addr_is_rejected() {
    let config = Config::builder().revision(1).listen_addr("  ").build();
    assert!(matches!(config.validate(), Err(Js5Error::Config(_))));
}

#[test]
fn test_open_missing_cache_fails() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .cache_dir(temp.path().join("missing"))
        .revision(REVISION)
        .build();
    assert!(matches!(Engine::open(config), Err(Js5Error::Cache(_))));
}

#[test]
fn test_open_disk_cache() {
    let temp = TempDir::new().unwrap();
    write_sample_disk_cache(temp.path(), 3);
    let config = Config::builder()
        .cache_dir(temp.path())
        .revision(REVISION)
        .build();

    let engine = Engine::open(config).unwrap();
    assert_eq!(engine.revision(), REVISION);
    assert_eq!(engine.descriptor().index_count(), 3);
    assert_eq!(engine.store().index_count(), 3);
    assert_eq!(engine.store().entry_count(META_INDEX), 3);

    let revisions: Vec<u32> = engine.descriptor().entries().map(|e| e.revision).collect();
    assert_eq!(revisions, vec![500, 501, 502]);
}

// =============================================================================
// Fetch Tests
// =============================================================================

#[test]
fn test_fetch_descriptor() {
    let engine = sample_engine();
    let response = engine.fetch(&urgent(255, 255)).unwrap();
    assert_eq!(&response, engine.descriptor().bytes());
}

#[test]
fn test_fetch_descriptor_is_stable() {
    let engine = sample_engine();
    let first = engine.fetch(&urgent(255, 255)).unwrap();
    for _ in 0..10 {
        assert_eq!(engine.fetch(&urgent(255, 255)).unwrap(), first);
    }
    let background = FileRequest::new(255, 255, Priority::Background);
    assert_eq!(engine.fetch(&background).unwrap(), first);
}

#[test]
fn test_fetch_trims_trailer() {
    let engine = sample_engine();
    let response = engine.fetch(&urgent(2, 1)).unwrap();
    // sample_store: entry 1 of index 2 holds 202 payload bytes + trailer
    assert_eq!(&response[..], &plain_container(&payload(202))[..]);
}

#[test]
fn test_fetch_reference_table() {
    let engine = sample_engine();
    let response = engine.fetch(&urgent(255, 0)).unwrap();
    assert_eq!(response[0], 2);
}

#[test]
fn test_fetch_out_of_range() {
    let engine = sample_engine();
    for (index, entry) in [(0, 3), (9, 0), (255, 200), (254, 0)] {
        assert!(matches!(
            engine.fetch(&urgent(index, entry)),
            Err(Js5Error::EntryNotFound { .. })
        ));
    }
}

#[test]
fn test_fetch_truncated_entry() {
    let mut store = sample_store(1);
    let mut broken = plain_container(&payload(100));
    broken.truncate(50);
    store.insert(0, 9, broken);

    let engine = Engine::with_store(test_config(), Arc::new(store)).unwrap();
    assert!(matches!(
        engine.fetch(&urgent(0, 9)),
        Err(Js5Error::TruncatedEntry { expected: 105, actual: 50 })
    ));
}

#[test]
fn test_undecodable_tables_prevent_startup() {
    // A store whose reference tables cannot be decoded never yields an engine
    let store = MemoryStore::new(1).with_entry(255, 0, with_trailer(plain_container(&[1]), 0));
    assert!(matches!(
        Engine::with_store(test_config(), Arc::new(store)),
        Err(Js5Error::Descriptor(_))
    ));
}
