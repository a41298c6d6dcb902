//! Container envelope
//!
//! Header parsing, trimming and decompression of stored containers.

use std::io::Read;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;

use crate::error::{Js5Error, Result};

/// Header length of an uncompressed container: tag (1) + length (4)
pub const PLAIN_HEADER_LEN: usize = 5;

/// Header length of a compressed container: adds uncompressed length (4)
pub const COMPRESSED_HEADER_LEN: usize = 9;

/// bzip2 stream magic stripped from stored containers
const BZIP2_MAGIC: &[u8] = b"BZh1";

/// Upper bound on the buffer reserved up front for a decompressed payload
const MAX_PREALLOC: usize = 1024 * 1024;

/// Compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Compression {
    None = 0,
    Bzip2 = 1,
    Gzip = 2,
}

impl TryFrom<u8> for Compression {
    type Error = Js5Error;

    fn try_from(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Bzip2),
            2 => Ok(Compression::Gzip),
            _ => Err(Js5Error::Decompression(format!(
                "Unknown compression type: {}",
                tag
            ))),
        }
    }
}

/// Header length for a compression tag
///
/// Any non-zero tag carries the extra uncompressed length field.
pub fn header_len(compression: u8) -> usize {
    if compression == 0 {
        PLAIN_HEADER_LEN
    } else {
        COMPRESSED_HEADER_LEN
    }
}

/// Exact transmit length of a container: header + declared size
pub fn trimmed_len(data: &[u8]) -> Result<usize> {
    if data.len() < PLAIN_HEADER_LEN {
        return Err(Js5Error::TruncatedEntry {
            expected: PLAIN_HEADER_LEN,
            actual: data.len(),
        });
    }

    let size = u32::from_be_bytes([data[1], data[2], data[3], data[4]]) as usize;
    let expected = header_len(data[0]) + size;

    if data.len() < expected {
        return Err(Js5Error::TruncatedEntry {
            expected,
            actual: data.len(),
        });
    }

    Ok(expected)
}

/// Cut a stored container down to exactly what a client should receive
pub fn trim(data: &[u8]) -> Result<&[u8]> {
    let len = trimmed_len(data)?;
    Ok(&data[..len])
}

/// Decompress a stored container into its payload
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let container = trim(data)?;
    let compression = Compression::try_from(container[0])?;

    if compression == Compression::None {
        return Ok(container[PLAIN_HEADER_LEN..].to_vec());
    }

    let expected = u32::from_be_bytes([container[5], container[6], container[7], container[8]]) as usize;
    let body = &container[COMPRESSED_HEADER_LEN..];

    // Declared length is untrusted; cap the reservation and stop one byte past it
    let mut payload = Vec::with_capacity(expected.min(MAX_PREALLOC));
    let limit = expected as u64 + 1;

    let decoded = match compression {
        Compression::Bzip2 => BzDecoder::new(BZIP2_MAGIC.chain(body))
            .take(limit)
            .read_to_end(&mut payload),
        _ => GzDecoder::new(body).take(limit).read_to_end(&mut payload),
    };
    decoded.map_err(|e| Js5Error::Decompression(format!("{:?}: {}", compression, e)))?;

    if payload.len() != expected {
        return Err(Js5Error::Decompression(format!(
            "Length mismatch: header declares {} bytes, got {}",
            expected,
            payload.len()
        )));
    }

    Ok(payload)
}
