//! Engine Module
//!
//! Couples the cache store with the precomputed descriptor and answers
//! file requests.
//!
//! ## Responsibilities
//! - Validate configuration and open the cache on startup
//! - Build the global descriptor before any connection is accepted
//! - Resolve, read and trim entries for file requests

use std::sync::Arc;

use bytes::Bytes;

use crate::cache::{self, CacheStore, DiskStore};
use crate::config::Config;
use crate::descriptor::GlobalDescriptor;
use crate::error::{Js5Error, Result};
use crate::protocol::FileRequest;

/// The file-serving engine
///
/// ## Concurrency Model: read-only after `open`
///
/// - The descriptor is built once and never mutated
/// - The store only serves reads and handles its own locking
/// - Every connection holds an `Arc<Engine>`; no engine-level locks exist
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Backing cache
    store: Arc<dyn CacheStore>,

    /// Answer to the (255, 255) request
    descriptor: GlobalDescriptor,
}

impl Engine {
    /// Open the cache named by the config and build the descriptor
    ///
    /// On startup:
    /// 1. Validate config
    /// 2. Open the on-disk cache
    /// 3. Build the global descriptor
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        let store = DiskStore::open(&config.cache_dir)?;
        tracing::info!("Serving cache at {}", store.dir().display());
        Self::with_store(config, Arc::new(store))
    }

    /// Build an engine over an already opened store
    pub fn with_store(config: Config, store: Arc<dyn CacheStore>) -> Result<Self> {
        config.validate()?;

        tracing::info!("Computing descriptor for {} indices", store.index_count());
        let descriptor = GlobalDescriptor::build(store.as_ref())?;

        Ok(Self {
            config,
            store,
            descriptor,
        })
    }

    /// Fetch the trimmed container answering a file request
    ///
    /// Returns `EntryNotFound` for out-of-range or absent entries and
    /// `TruncatedEntry` when the stored buffer is shorter than its header
    /// declares.
    pub fn fetch(&self, request: &FileRequest) -> Result<Bytes> {
        if request.is_descriptor() {
            return Ok(self.descriptor.bytes().clone());
        }

        let entry = self
            .store
            .entry(request.index, request.entry as u32)
            .ok_or(Js5Error::EntryNotFound {
                index: request.index,
                entry: request.entry as u32,
            })?;

        let raw = Bytes::from(self.store.read_raw(entry)?);
        let len = cache::trimmed_len(&raw)?;
        Ok(raw.slice(..len))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Revision clients must present in the handshake
    pub fn revision(&self) -> u32 {
        self.config.revision
    }

    /// Get the global descriptor
    pub fn descriptor(&self) -> &GlobalDescriptor {
        &self.descriptor
    }

    /// Get the backing store
    pub fn store(&self) -> &dyn CacheStore {
        self.store.as_ref()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
