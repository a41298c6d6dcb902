//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{Js5Error, Result};
use crate::protocol::{
    read_request, write_chunked, write_handshake_status, FileRequest, HandshakeStatus, Request,
};

/// Per-connection protocol state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    /// Whether a handshake with the right revision has been seen
    pub handshake_completed: bool,
}

/// What the loop does after a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

impl ConnectionState {
    /// Apply one request, writing any response to `writer`
    pub fn process<W: Write>(
        &mut self,
        engine: &Engine,
        request: Request,
        writer: &mut W,
        peer_addr: &str,
    ) -> Result<Flow> {
        match request {
            Request::Handshake { revision } => {
                if revision == engine.revision() {
                    write_handshake_status(writer, HandshakeStatus::Ok)?;
                    self.handshake_completed = true;
                    tracing::debug!("Handshake accepted from {} (revision {})", peer_addr, revision);
                    Ok(Flow::Continue)
                } else {
                    write_handshake_status(writer, HandshakeStatus::OutOfDate)?;
                    tracing::info!(
                        "Rejected {}: revision {} (server is {})",
                        peer_addr,
                        revision,
                        engine.revision()
                    );
                    Ok(Flow::Close)
                }
            }
            Request::Control { opcode } => {
                tracing::trace!("Control opcode {:?} from {}", opcode, peer_addr);
                Ok(Flow::Continue)
            }
            Request::File(file) => {
                // Lenient by default: early requests are served
                if !self.handshake_completed && engine.config().strict_handshake {
                    return Err(Js5Error::HandshakeRequired);
                }
                send_file(engine, &file, writer, peer_addr)?;
                Ok(Flow::Continue)
            }
        }
    }
}

/// Answer a file request; lookup failures send nothing
fn send_file<W: Write>(
    engine: &Engine,
    file: &FileRequest,
    writer: &mut W,
    peer_addr: &str,
) -> Result<()> {
    let container = match engine.fetch(file) {
        Ok(container) => container,
        Err(e @ Js5Error::EntryNotFound { .. }) => {
            tracing::debug!("Skipping request from {}: {}", peer_addr, e);
            return Ok(());
        }
        Err(e) => {
            tracing::warn!(
                "Skipping request {}/{} from {}: {}",
                file.index,
                file.entry,
                peer_addr,
                e
            );
            return Ok(());
        }
    };

    tracing::trace!(
        "Sending {}/{} ({} bytes, {:?}) to {}",
        file.index,
        file.entry,
        container.len(),
        file.priority,
        peer_addr
    );

    write_chunked(writer, file.index, file.entry, &container)?;
    // One flush per response
    writer.flush()?;
    Ok(())
}

/// Run the request loop until the peer goes away or the connection must close
///
/// End of stream, resets and timeouts end the loop normally. Unknown
/// opcodes and strict-handshake violations are returned as errors.
pub fn serve<R: Read, W: Write>(
    engine: &Engine,
    reader: &mut R,
    writer: &mut W,
    peer_addr: &str,
) -> Result<()> {
    let mut state = ConnectionState::default();

    loop {
        let request = match read_request(reader) {
            Ok(request) => request,
            Err(e) if e.is_disconnect() => {
                tracing::debug!("Client {} disconnected", peer_addr);
                return Ok(());
            }
            Err(e) if e.is_timeout() => {
                tracing::debug!("Read timeout for client {}", peer_addr);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        tracing::trace!("Received request from {}: {:?}", peer_addr, request);

        match state.process(engine, request, writer, peer_addr) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Close) => return Ok(()),
            Err(e) if e.is_disconnect() => {
                tracing::debug!(
                    "Client {} disconnected before response could be sent: {}",
                    peer_addr,
                    e
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        }
    }
}

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared engine
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O and disables Nagle's algorithm
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 leaves a direction unbounded)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        if read_ms > 0 {
            self.reader
                .get_ref()
                .set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            self.writer
                .get_ref()
                .set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// The socket is shut down on return, whatever the outcome.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let result = serve(&self.engine, &mut self.reader, &mut self.writer, &self.peer_addr);

        // Best effort: the peer may already be gone
        let _ = self.writer.flush();
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);

        if let Err(ref e) = result {
            tracing::warn!("Closing {}: {}", self.peer_addr, e);
        }
        result
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}
