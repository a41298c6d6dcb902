//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request Format
//! ```text
//! ┌──────────┬─────────────────────────────────────────┐
//! │Opcode (1)│ Payload (3, or 4 for the handshake)     │
//! └──────────┴─────────────────────────────────────────┘
//! ```
//!
//! ### Payload by Opcode
//! - 15 (handshake):   revision (4)
//! - 0, 1 (file):      index (1) + entry (2)
//! - 2, 3, 6 (control): 3 ignored bytes
//!
//! ### File Response Format
//! ```text
//! ┌──────────┬───────────┬──────────────┬──────┬──────────────┬──────┬─────
//! │Index (1) │ Entry (2) │  Data (509)  │ 0xFF │  Data (512)  │ 0xFF │ ...
//! └──────────┴───────────┴──────────────┴──────┴──────────────┴──────┴─────
//! ```
//! Blocks are 512 bytes counted from the start of the header. A separator
//! follows a full block only when more data remains, and is not counted
//! toward the next block.

use std::io::{Read, Write};

use bytes::Bytes;

use crate::cache::{header_len, PLAIN_HEADER_LEN};
use crate::error::{Js5Error, Result};
use super::{FileRequest, FileResponse, HandshakeStatus, Opcode, Priority, Request};

/// File response header size: index (1) + entry (2)
pub const RESPONSE_HEADER_SIZE: usize = 3;

/// Transport block size
pub const BLOCK_SIZE: usize = 512;

/// Byte inserted between blocks
pub const SEPARATOR: u8 = 0xFF;

/// Largest container a client will accept (32 MB)
pub const MAX_CONTAINER_SIZE: usize = 32 * 1024 * 1024;

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
///
/// Control payloads are sent as zeros.
pub fn encode_request(request: &Request) -> Vec<u8> {
    let mut message = Vec::with_capacity(5);
    message.push(request.opcode() as u8);

    match request {
        Request::Handshake { revision } => message.extend_from_slice(&revision.to_be_bytes()),
        Request::Control { .. } => message.extend_from_slice(&[0, 0, 0]),
        Request::File(file) => {
            message.push(file.index);
            message.extend_from_slice(&file.entry.to_be_bytes());
        }
    }

    message
}

/// Decode a request from bytes (opcode followed by its full payload)
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (&opcode_byte, payload) = bytes
        .split_first()
        .ok_or_else(|| Js5Error::Protocol("Empty request".to_string()))?;

    let opcode = Opcode::from_byte(opcode_byte).ok_or(Js5Error::UnknownOpcode(opcode_byte))?;

    if payload.len() != opcode.payload_len() {
        return Err(Js5Error::Protocol(format!(
            "Opcode {}: expected {} payload bytes, got {}",
            opcode_byte,
            opcode.payload_len(),
            payload.len()
        )));
    }

    let request = match opcode {
        Opcode::Handshake => Request::Handshake {
            revision: u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]),
        },
        Opcode::LoggedIn | Opcode::LoggedOut | Opcode::Reset => Request::Control { opcode },
        Opcode::UrgentFile | Opcode::BackgroundFile => {
            let priority = if opcode == Opcode::UrgentFile {
                Priority::Urgent
            } else {
                Priority::Background
            };
            Request::File(FileRequest::new(
                payload[0],
                u16::from_be_bytes([payload[1], payload[2]]),
                priority,
            ))
        }
    };

    Ok(request)
}

// =============================================================================
// Chunked Framing
// =============================================================================

/// Number of bytes `write_chunked` emits for a payload of `payload_len`
pub fn framed_len(payload_len: usize) -> usize {
    RESPONSE_HEADER_SIZE + payload_len + (payload_len + RESPONSE_HEADER_SIZE - 1) / BLOCK_SIZE
}

/// Frame a file response into a new buffer
pub fn encode_chunked(index: u8, entry: u16, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(framed_len(data.len()));
    // Writing into a Vec cannot fail
    let _ = write_chunked(&mut out, index, entry, data);
    out
}

/// Write a file response: header, then data split into 512-byte blocks
pub fn write_chunked<W: Write>(writer: &mut W, index: u8, entry: u16, data: &[u8]) -> Result<()> {
    let [hi, lo] = entry.to_be_bytes();
    writer.write_all(&[index, hi, lo])?;

    let mut position = RESPONSE_HEADER_SIZE;
    let mut remaining = data;

    while !remaining.is_empty() {
        let block_len = (BLOCK_SIZE - position % BLOCK_SIZE).min(remaining.len());
        let (block, rest) = remaining.split_at(block_len);

        writer.write_all(block)?;
        position += block_len;
        remaining = rest;

        if position % BLOCK_SIZE == 0 && !remaining.is_empty() {
            writer.write_all(&[SEPARATOR])?;
        }
    }

    Ok(())
}

/// Read one file response, stripping separators
///
/// The payload length is taken from the container header inside the data.
pub fn read_chunked<R: Read>(reader: &mut R) -> Result<FileResponse> {
    let mut header = [0u8; RESPONSE_HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let mut blocks = BlockReader {
        inner: reader,
        position: RESPONSE_HEADER_SIZE,
    };

    let mut prefix = [0u8; PLAIN_HEADER_LEN];
    blocks.read_payload(&mut prefix)?;

    let size = u32::from_be_bytes([prefix[1], prefix[2], prefix[3], prefix[4]]) as usize;
    let total = header_len(prefix[0]) + size;
    if total > MAX_CONTAINER_SIZE {
        return Err(Js5Error::Protocol(format!(
            "Container too large: {} bytes (max {})",
            total, MAX_CONTAINER_SIZE
        )));
    }

    let mut container = vec![0u8; total];
    container[..PLAIN_HEADER_LEN].copy_from_slice(&prefix);
    blocks.read_payload(&mut container[PLAIN_HEADER_LEN..])?;

    Ok(FileResponse {
        index: header[0],
        entry: u16::from_be_bytes([header[1], header[2]]),
        container: Bytes::from(container),
    })
}

/// Tracks block position while reading framed data
struct BlockReader<'a, R> {
    inner: &'a mut R,
    position: usize,
}

impl<R: Read> BlockReader<'_, R> {
    fn read_payload(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;

        while filled < buf.len() {
            if self.position % BLOCK_SIZE == 0 {
                let mut separator = [0u8; 1];
                self.inner.read_exact(&mut separator)?;
                if separator[0] != SEPARATOR {
                    return Err(Js5Error::Protocol(format!(
                        "Expected block separator at offset {}, got 0x{:02x}",
                        self.position, separator[0]
                    )));
                }
            }

            let n = (BLOCK_SIZE - self.position % BLOCK_SIZE).min(buf.len() - filled);
            self.inner.read_exact(&mut buf[filled..filled + n])?;
            filled += n;
            self.position += n;
        }

        Ok(())
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read a complete request from a stream
///
/// Blocks until a request is received or an error occurs. An unknown
/// opcode is reported before any payload is consumed.
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let mut message = [0u8; 5];
    reader.read_exact(&mut message[..1])?;

    let opcode = Opcode::from_byte(message[0]).ok_or(Js5Error::UnknownOpcode(message[0]))?;
    let len = 1 + opcode.payload_len();
    reader.read_exact(&mut message[1..len])?;

    decode_request(&message[..len])
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    writer.write_all(&encode_request(request))?;
    writer.flush()?;
    Ok(())
}

/// Write a handshake status byte
pub fn write_handshake_status<W: Write>(writer: &mut W, status: HandshakeStatus) -> Result<()> {
    writer.write_all(&[status as u8])?;
    writer.flush()?;
    Ok(())
}

/// Read a handshake status byte
pub fn read_handshake_status<R: Read>(reader: &mut R) -> Result<HandshakeStatus> {
    let mut status = [0u8; 1];
    reader.read_exact(&mut status)?;
    HandshakeStatus::from_byte(status[0]).ok_or_else(|| {
        Js5Error::Protocol(format!("Unknown handshake status: {}", status[0]))
    })
}
