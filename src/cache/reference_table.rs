//! Reference tables
//!
//! Per-index metadata stored in the meta index (255). Only the leading
//! fields are decoded; the server needs nothing past the revision.

use crate::error::{Js5Error, Result};

/// Oldest supported reference table format
const MIN_FORMAT: u8 = 5;

/// Newest supported reference table format
const MAX_FORMAT: u8 = 7;

/// First format that carries a revision
const REVISION_FORMAT: u8 = 6;

/// First format that stores counts as "big smart" values
const SMART_FORMAT: u8 = 7;

/// Decoded reference table header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceTable {
    /// Table format version
    pub format: u8,

    /// Revision of the index (0 for formats without one)
    pub revision: u32,

    /// Flag bits (names, digests, lengths, hashes)
    pub flags: u8,

    /// Number of entries described by the table
    pub entry_count: u32,
}

impl ReferenceTable {
    /// Decode a reference table from a decompressed meta-index payload
    pub fn decode(data: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(data);

        let format = cursor.u8()?;
        if !(MIN_FORMAT..=MAX_FORMAT).contains(&format) {
            return Err(Js5Error::ReferenceTable(format!(
                "Unsupported format: {}",
                format
            )));
        }

        let revision = if format >= REVISION_FORMAT {
            cursor.u32()?
        } else {
            0
        };

        let flags = cursor.u8()?;

        let entry_count = if format >= SMART_FORMAT {
            cursor.big_smart()?
        } else {
            cursor.u16()? as u32
        };

        Ok(Self {
            format,
            revision,
            flags,
            entry_count,
        })
    }
}

/// Bounds-checked big-endian reader
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.data.len() {
            return Err(Js5Error::ReferenceTable(format!(
                "Unexpected end of table at offset {} (need {} bytes, have {})",
                self.pos,
                n,
                self.data.len() - self.pos
            )));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// 2 bytes when the high bit is clear, otherwise 4 bytes with it masked
    fn big_smart(&mut self) -> Result<u32> {
        let peek = *self.data.get(self.pos).ok_or_else(|| {
            Js5Error::ReferenceTable("Unexpected end of table reading smart".to_string())
        })?;
        if peek & 0x80 == 0 {
            Ok(self.u16()? as u32)
        } else {
            Ok(self.u32()? & 0x7FFF_FFFF)
        }
    }
}
