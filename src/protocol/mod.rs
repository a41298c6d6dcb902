//! Protocol Module
//!
//! Defines the JS5 wire protocol between game clients and the server.
//!
//! ## Requests
//! ```text
//! ┌──────────┬──────────────────────────┐
//! │Opcode (1)│ Payload (3 or 4)         │
//! └──────────┴──────────────────────────┘
//! ```
//!
//! ### Opcodes
//! - 0x00: urgent file request      - index (1) + entry (2)
//! - 0x01: background file request  - index (1) + entry (2)
//! - 0x02, 0x03, 0x06: control      - 3 ignored bytes
//! - 0x0F: handshake                - revision (4)
//!
//! ## Responses
//! - Handshake: one status byte (0x00 OK, 0x06 out of date)
//! - File: index (1) + entry (2) + container split into 512-byte blocks
//!
//! Unknown opcodes are a protocol violation.

mod request;
mod response;
mod codec;

pub use request::{FileRequest, Opcode, Priority, Request};
pub use response::{FileResponse, HandshakeStatus};
pub use codec::{
    decode_request, encode_chunked, encode_request, framed_len, read_chunked,
    read_handshake_status, read_request, write_chunked, write_handshake_status, write_request,
    BLOCK_SIZE, RESPONSE_HEADER_SIZE, SEPARATOR,
};
