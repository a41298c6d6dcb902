//! Network Module
//!
//! TCP server and client handling.
//!
//! ## Architecture
//! - Single acceptor loop
//! - One thread per connection, requests handled strictly in order
//! - File requests routed through the Engine

mod server;
mod connection;

pub use server::{Server, ShutdownHandle};
pub use connection::{serve, Connection, ConnectionState, Flow};
