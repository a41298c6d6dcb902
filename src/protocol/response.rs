//! Response definitions
//!
//! Represents responses to clients.

use bytes::Bytes;

/// Handshake status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HandshakeStatus {
    Ok = 0,
    OutOfDate = 6,
}

impl HandshakeStatus {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(HandshakeStatus::Ok),
            6 => Some(HandshakeStatus::OutOfDate),
            _ => None,
        }
    }
}

/// A file response as seen by a client, separators removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResponse {
    pub index: u8,
    pub entry: u16,

    /// Trimmed container (compression tag, length fields, payload)
    pub container: Bytes,
}
