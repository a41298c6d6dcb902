//! Container Tests
//!
//! Tests for trimming, decompression and reference table decoding.

#[path = "../common/mod.rs"]
mod common;

use common::{
    bzip2_container, gzip_container, payload, plain_container, reference_table, with_trailer,
};
use js5d::cache::{decompress, header_len, trim, trimmed_len, Compression, ReferenceTable};
use js5d::Js5Error;
use proptest::prelude::*;

// =============================================================================
// Trim Tests
// =============================================================================

#[test]
fn test_header_len() {
    assert_eq!(header_len(0), 5);
    assert_eq!(header_len(1), 9);
    assert_eq!(header_len(2), 9);
    assert_eq!(header_len(200), 9);
}

#[test]
fn test_trim_uncompressed_drops_trailer() {
    let container = plain_container(&payload(40));
    let stored = with_trailer(container.clone(), 12);

    let trimmed = trim(&stored).unwrap();
    assert_eq!(trimmed.len(), 40 + 5);
    assert_eq!(trimmed, &container[..]);
}

#[test]
fn test_trim_compressed_counts_extra_length_field() {
    let container = gzip_container(&payload(1000));
    let size = u32::from_be_bytes([container[1], container[2], container[3], container[4]]);
    let mut stored = container.clone();
    stored.extend_from_slice(&[0xAA; 37]);

    let trimmed = trim(&stored).unwrap();
    assert_eq!(trimmed.len(), size as usize + 9);
    assert_eq!(trimmed, &container[..]);
}

#[test]
fn test_trim_is_idempotent() {
    let stored = with_trailer(bzip2_container(&payload(300)), 3);
    let once = trim(&stored).unwrap();
    let twice = trim(once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_trim_empty_payload() {
    let container = plain_container(&[]);
    assert_eq!(trim(&container).unwrap(), &[0, 0, 0, 0, 0][..]);
}

#[test]
fn test_trim_truncated_buffer() {
    let mut container = plain_container(&payload(50));
    container.truncate(30);

    match trim(&container) {
        Err(Js5Error::TruncatedEntry { expected, actual }) => {
            assert_eq!(expected, 55);
            assert_eq!(actual, 30);
        }
        other => panic!("Expected TruncatedEntry, got {:?}", other),
    }
}

#[test]
fn test_trim_shorter_than_header() {
    assert!(matches!(
        trimmed_len(&[0, 0, 0]),
        Err(Js5Error::TruncatedEntry { expected: 5, actual: 3 })
    ));
}

// =============================================================================
// Decompression Tests
// =============================================================================

#[test]
fn test_decompress_none() {
    let data = payload(64);
    let stored = with_trailer(plain_container(&data), 1);
    assert_eq!(decompress(&stored).unwrap(), data);
}

#[test]
fn test_decompress_gzip() {
    let data = payload(10_000);
    assert_eq!(decompress(&gzip_container(&data)).unwrap(), data);
}

#[test]
fn test_decompress_bzip2() {
    let data = payload(10_000);
    assert_eq!(decompress(&bzip2_container(&data)).unwrap(), data);
}

#[test]
fn test_decompress_length_mismatch() {
    let mut container = gzip_container(&payload(100));
    // Declared uncompressed length lives in bytes 5..9
    container[8] = container[8].wrapping_add(1);
    assert!(matches!(
        decompress(&container),
        Err(Js5Error::Decompression(_))
    ));
}

#[test]
fn test_decompress_huge_declared_length() {
    let mut container = gzip_container(&payload(100));
    container[5..9].copy_from_slice(&u32::MAX.to_be_bytes());
    match decompress(&container) {
        Err(Js5Error::Decompression(msg)) => assert!(msg.contains("Length mismatch")),
        other => panic!("Expected Decompression, got {:?}", other),
    }
}

#[test]
fn test_decompress_stream_longer_than_declared() {
    let mut container = bzip2_container(&payload(5000));
    container[5..9].copy_from_slice(&10u32.to_be_bytes());
    match decompress(&container) {
        Err(Js5Error::Decompression(msg)) => assert!(msg.contains("got 11")),
        other => panic!("Expected Decompression, got {:?}", other),
    }
}

#[test]
fn test_decompress_unknown_compression() {
    let mut container = gzip_container(&payload(100));
    container[0] = 9;
    assert!(matches!(
        decompress(&container),
        Err(Js5Error::Decompression(_))
    ));
}

#[test]
fn test_compression_from_tag() {
    assert_eq!(Compression::try_from(0).unwrap(), Compression::None);
    assert_eq!(Compression::try_from(1).unwrap(), Compression::Bzip2);
    assert_eq!(Compression::try_from(2).unwrap(), Compression::Gzip);
    assert!(Compression::try_from(3).is_err());
}

// =============================================================================
// Reference Table Tests
// =============================================================================

#[test]
fn test_reference_table_format_5_has_no_revision() {
    let table = ReferenceTable::decode(&reference_table(5, 999, 12)).unwrap();
    assert_eq!(table.format, 5);
    assert_eq!(table.revision, 0);
    assert_eq!(table.entry_count, 12);
}

#[test]
fn test_reference_table_format_6() {
    let table = ReferenceTable::decode(&reference_table(6, 0x0102_0304, 300)).unwrap();
    assert_eq!(table.revision, 0x0102_0304);
    assert_eq!(table.entry_count, 300);
}

#[test]
fn test_reference_table_format_7_big_smart() {
    let mut data = vec![7u8];
    data.extend_from_slice(&42u32.to_be_bytes());
    data.push(1);
    data.extend_from_slice(&(0x8000_0000u32 | 70_000).to_be_bytes());

    let table = ReferenceTable::decode(&data).unwrap();
    assert_eq!(table.revision, 42);
    assert_eq!(table.flags, 1);
    assert_eq!(table.entry_count, 70_000);
}

#[test]
fn test_reference_table_unsupported_format() {
    assert!(matches!(
        ReferenceTable::decode(&reference_table(4, 1, 1)),
        Err(Js5Error::ReferenceTable(_))
    ));
    assert!(matches!(
        ReferenceTable::decode(&reference_table(8, 1, 1)),
        Err(Js5Error::ReferenceTable(_))
    ));
}

#[test]
fn test_reference_table_truncated() {
    assert!(matches!(
        ReferenceTable::decode(&[6, 0, 0]),
        Err(Js5Error::ReferenceTable(_))
    ));
    assert!(matches!(
        ReferenceTable::decode(&[]),
        Err(Js5Error::ReferenceTable(_))
    ));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn proptest_trim_length(
        compressed in any::<bool>(),
        size in 0usize..2048,
        slack in 0usize..64,
    ) {
        let header = if compressed { 9 } else { 5 };
        let mut stored = vec![0u8; header + size + slack];
        stored[0] = if compressed { 2 } else { 0 };
        stored[1..5].copy_from_slice(&(size as u32).to_be_bytes());

        let trimmed = trim(&stored).unwrap();
        prop_assert_eq!(trimmed.len(), size + header);
        prop_assert_eq!(trim(trimmed).unwrap(), trimmed);
    }
}
