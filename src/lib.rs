//! # js5d
//!
//! A JS5 file server. Game clients connect over TCP, pass a revision
//! handshake, and fetch versioned cache entries streamed in 512-byte blocks.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Listener                            │
//! │               (one thread per connection)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │               Connection State Machine                       │
//! │        (handshake, control opcodes, file requests)           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   Engine    │          │   Framer    │
//!   │ (255, 255)  │ ───────► │ (512-byte   │
//!   │ descriptor  │  trimmed │   blocks)   │
//!   └──────┬──────┘  entries └─────────────┘
//!          │
//!          ▼
//!   ┌─────────────┐
//!   │    Cache    │
//!   │ (.dat2/.idx)│
//!   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod cache;
pub mod protocol;
pub mod descriptor;
pub mod engine;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Js5Error, Result};
pub use config::Config;
pub use descriptor::GlobalDescriptor;
pub use engine::Engine;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of js5d
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
