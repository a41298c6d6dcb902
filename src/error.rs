//! Error types for js5d
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using Js5Error
pub type Result<T> = std::result::Result<T, Js5Error>;

/// Unified error type for js5d operations
#[derive(Debug, Error)]
pub enum Js5Error {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Cache Errors
    // -------------------------------------------------------------------------
    #[error("Cache corruption: {0}")]
    Cache(String),

    #[error("Entry not found: index {index}, entry {entry}")]
    EntryNotFound { index: u8, entry: u32 },

    #[error("Truncated entry: header declares {expected} bytes, buffer holds {actual}")]
    TruncatedEntry { expected: usize, actual: usize },

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Reference table error: {0}")]
    ReferenceTable(String),

    // -------------------------------------------------------------------------
    // Descriptor Errors
    // -------------------------------------------------------------------------
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown opcode: {0}")]
    UnknownOpcode(u8),

    #[error("File request received before handshake")]
    HandshakeRequired,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Js5Error {
    /// True when the error means the peer went away rather than misbehaved
    pub fn is_disconnect(&self) -> bool {
        match self {
            Js5Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }

    /// True when the error is an expired socket timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            // Windows reports TimedOut, unix WouldBlock
            Js5Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}
