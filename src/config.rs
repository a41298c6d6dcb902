//! Configuration for js5d
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{Js5Error, Result};

/// Default JS5 listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:43594";

/// Main configuration for a js5d instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the cache files
    /// Internal structure:
    ///   {cache_dir}/
    ///     ├── main_file_cache.dat2       (sector data)
    ///     ├── main_file_cache.idx0..N    (pointers per index)
    ///     └── main_file_cache.idx255     (reference tables)
    pub cache_dir: PathBuf,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Client revision accepted during the handshake (must be > 0)
    pub revision: u32,

    /// Close connections that request files before a successful handshake
    pub strict_handshake: bool,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./cache"),
            revision: 0,
            strict_handshake: false,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the settings that must hold before the server starts
    pub fn validate(&self) -> Result<()> {
        if self.revision == 0 {
            return Err(Js5Error::Config(
                "revision must be a positive number".to_string(),
            ));
        }
        if self.listen_addr.trim().is_empty() {
            return Err(Js5Error::Config("listen address is empty".to_string()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the cache directory
    pub fn cache_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_dir = path.into();
        self
    }

    /// Set the revision enforced by the handshake
    pub fn revision(mut self, revision: u32) -> Self {
        self.config.revision = revision;
        self
    }

    /// Require a handshake before serving file requests
    pub fn strict_handshake(mut self, strict: bool) -> Self {
        self.config.strict_handshake = strict;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
