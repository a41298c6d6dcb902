//! Disk Store
//!
//! Reads entries from the sector-chained `.dat2` / `.idx` file layout.
//!
//! ## Index File
//! ```text
//! ┌──────────────────┬──────────────────┐
//! │ Size (3)         │ First Sector (3) │   × entry count
//! └──────────────────┴──────────────────┘
//! ```
//!
//! ## Data File (520-byte sectors)
//! ```text
//! ┌───────────┬───────────┬──────────┬───────────┬──────────────────┐
//! │ Entry (2) │ Chunk (2) │ Next (3) │ Index (1) │    Data (512)    │
//! └───────────┴───────────┴──────────┴───────────┴──────────────────┘
//! ```
//! Entries with ids above 0xFFFF use a 4-byte entry field and 510 data bytes.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{Js5Error, Result};

use super::{CacheStore, EntryRef, META_INDEX};

/// Data file name
pub const DATA_FILENAME: &str = "main_file_cache.dat2";

/// Size of one index pointer
pub const POINTER_SIZE: usize = 6;

/// Size of one data sector including its header
pub const SECTOR_SIZE: usize = 520;

/// Sector header for entry ids that fit in 16 bits
pub const SECTOR_HEADER_SIZE: usize = 8;

/// Sector header for larger entry ids
pub const EXTENDED_SECTOR_HEADER_SIZE: usize = 10;

/// An open `.idx` file
struct IndexFile {
    file: Mutex<File>,
    entry_count: usize,
}

impl IndexFile {
    fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let entry_count = file.metadata()?.len() as usize / POINTER_SIZE;
        Ok(Self {
            file: Mutex::new(file),
            entry_count,
        })
    }

    /// Read the (size, first sector) pointer for an entry
    fn pointer(&self, entry: u32) -> Result<(usize, u64)> {
        let mut buf = [0u8; POINTER_SIZE];
        {
            let mut file = self.file.lock();
            file.seek(SeekFrom::Start(entry as u64 * POINTER_SIZE as u64))?;
            file.read_exact(&mut buf)?;
        }
        let size = u24(&buf[0..3]) as usize;
        let sector = u24(&buf[3..6]) as u64;
        Ok((size, sector))
    }
}

/// Cache store backed by files on disk
///
/// ## Concurrency:
/// - Every file handle sits behind its own Mutex (seek + read pairs)
/// - All methods use `&self`, so one store serves every connection
pub struct DiskStore {
    /// Directory the cache was loaded from
    dir: PathBuf,

    /// Sector data shared by all indices
    data: Mutex<File>,

    /// Length of the data file at open
    data_len: u64,

    /// Real indices, idx0..idxN
    indices: Vec<IndexFile>,

    /// Meta index (idx255)
    meta: IndexFile,
}

impl DiskStore {
    /// Open a cache directory
    ///
    /// On open:
    /// 1. Open the data file
    /// 2. Open idx0, idx1, ... until the first gap
    /// 3. Open idx255 (mandatory)
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(Js5Error::Cache(format!(
                "Cache directory not found: {}",
                path.display()
            )));
        }

        let data_path = path.join(DATA_FILENAME);
        let data = File::open(&data_path).map_err(|e| {
            Js5Error::Cache(format!("Cannot open {}: {}", data_path.display(), e))
        })?;
        let data_len = data.metadata()?.len();

        // Real indices stop at the first missing idx file
        let mut indices = Vec::new();
        for id in 0..META_INDEX {
            let idx_path = Self::index_path(path, id);
            if !idx_path.is_file() {
                break;
            }
            indices.push(IndexFile::open(&idx_path)?);
        }

        let meta_path = Self::index_path(path, META_INDEX);
        let meta = IndexFile::open(&meta_path).map_err(|e| {
            Js5Error::Cache(format!("Cannot open {}: {}", meta_path.display(), e))
        })?;

        tracing::info!(
            "Loaded cache from {}: {} indices, {} reference tables",
            path.display(),
            indices.len(),
            meta.entry_count
        );

        Ok(Self {
            dir: path.to_path_buf(),
            data: Mutex::new(data),
            data_len,
            indices,
            meta,
        })
    }

    /// Directory the cache was loaded from
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the `.idx` file for an index
    pub fn index_path(dir: &Path, index: u8) -> PathBuf {
        dir.join(format!("main_file_cache.idx{}", index))
    }

    fn index_file(&self, index: u8) -> Option<&IndexFile> {
        if index == META_INDEX {
            Some(&self.meta)
        } else {
            self.indices.get(index as usize)
        }
    }

    /// Follow a sector chain and collect `size` bytes
    fn read_chain(&self, index: u8, entry: u32, size: usize, first_sector: u64) -> Result<Vec<u8>> {
        let extended = entry > 0xFFFF;
        let header_size = if extended {
            EXTENDED_SECTOR_HEADER_SIZE
        } else {
            SECTOR_HEADER_SIZE
        };
        let capacity = SECTOR_SIZE - header_size;

        let mut out = Vec::with_capacity(size);
        let mut sector = first_sector;
        let mut chunk: u16 = 0;
        let mut buf = [0u8; SECTOR_SIZE];

        let mut data = self.data.lock();

        while out.len() < size {
            // Sector 0 is reserved, so it doubles as the end-of-chain marker
            if sector == 0 || sector * SECTOR_SIZE as u64 >= self.data_len {
                return Err(Js5Error::Cache(format!(
                    "Sector chain for {}/{} ends early at sector {} ({} of {} bytes read)",
                    index,
                    entry,
                    sector,
                    out.len(),
                    size
                )));
            }

            // Last sector may be partially used
            let take = (size - out.len()).min(capacity);
            let sector_buf = &mut buf[..header_size + take];
            data.seek(SeekFrom::Start(sector * SECTOR_SIZE as u64))?;
            data.read_exact(sector_buf)?;

            // Parse header
            let (sector_entry, rest) = if extended {
                (
                    u32::from_be_bytes([sector_buf[0], sector_buf[1], sector_buf[2], sector_buf[3]]),
                    &sector_buf[4..],
                )
            } else {
                (u16::from_be_bytes([sector_buf[0], sector_buf[1]]) as u32, &sector_buf[2..])
            };
            let sector_chunk = u16::from_be_bytes([rest[0], rest[1]]);
            let next = u24(&rest[2..5]) as u64;
            let sector_index = rest[5];

            // Every sector must belong to this entry, in chunk order
            if sector_entry != entry || sector_chunk != chunk || sector_index != index {
                return Err(Js5Error::Cache(format!(
                    "Sector {} header mismatch: expected {}/{} chunk {}, found {}/{} chunk {}",
                    sector, index, entry, chunk, sector_index, sector_entry, sector_chunk
                )));
            }

            out.extend_from_slice(&rest[6..]);
            sector = next;
            chunk = chunk.wrapping_add(1);
        }

        Ok(out)
    }
}

impl CacheStore for DiskStore {
    fn index_count(&self) -> usize {
        self.indices.len()
    }

    fn entry_count(&self, index: u8) -> usize {
        self.index_file(index).map(|f| f.entry_count).unwrap_or(0)
    }

    fn read_raw(&self, entry: EntryRef) -> Result<Vec<u8>> {
        let not_found = Js5Error::EntryNotFound {
            index: entry.index(),
            entry: entry.entry(),
        };

        let index_file = match self.index_file(entry.index()) {
            Some(f) if (entry.entry() as usize) < f.entry_count => f,
            _ => return Err(not_found),
        };

        let (size, sector) = index_file.pointer(entry.entry())?;
        // Zeroed pointer: slot exists but was never written
        if size == 0 || sector == 0 {
            return Err(not_found);
        }

        self.read_chain(entry.index(), entry.entry(), size, sector)
    }
}

fn u24(b: &[u8]) -> u32 {
    ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32
}
