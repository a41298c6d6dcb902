//! TCP Server
//!
//! Accepts connections and hands each one to its own thread.

use std::io::ErrorKind;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::Result;

use super::Connection;

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Stops a running server from another thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// TCP server for js5d
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    next_connection_id: AtomicU64,
}

impl Server {
    /// Bind the listen address from the config
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
            next_connection_id: AtomicU64::new(1),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to stop accepting
    ///
    /// Connections already running are left to finish on their own.
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Accept connections until shutdown (blocking)
    ///
    /// Accept failures are logged and never end the loop.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Accepting connections");

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::info!("New connection: {}", addr);
                    self.spawn_connection(stream);
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::error!("Error accepting tcp connection: {}", e);
                }
            }
        }

        tracing::info!("Listener stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream) {
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::error!("Cannot configure accepted socket: {}", e);
            return;
        }

        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let engine = Arc::clone(&self.engine);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        let spawned = thread::Builder::new()
            .name(format!("js5-conn-{}", id))
            .spawn(move || {
                let mut connection = match Connection::new(stream, engine) {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::warn!("Cannot set up connection: {}", e);
                        return;
                    }
                };
                if let Err(e) = connection.set_timeouts(read_ms, write_ms) {
                    tracing::warn!("Cannot set timeouts for {}: {}", connection.peer_addr(), e);
                    return;
                }
                // Errors are logged by the connection itself
                let _ = connection.handle();
            });

        if let Err(e) = spawned {
            tracing::error!("Cannot spawn connection thread: {}", e);
        }
    }
}
