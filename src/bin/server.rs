//! js5d Server Binary
//!
//! Loads the cache, computes the descriptor and serves JS5 clients.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use js5d::cache::{CacheStore, META_INDEX};
use js5d::network::Server;
use js5d::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// js5d Server
#[derive(Parser, Debug)]
#[command(name = "js5d")]
#[command(about = "File server for the JS5 cache protocol")]
#[command(version)]
struct Args {
    /// Cache directory (main_file_cache.dat2 and .idx files)
    #[arg(short, long = "cache", alias = "filestore")]
    cache_dir: PathBuf,

    /// Client revision accepted by the handshake
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    revision: u32,

    /// Listen address (host:port)
    #[arg(short, long, default_value = js5d::config::DEFAULT_LISTEN_ADDR)]
    listen: String,

    /// Close connections that request files before a handshake
    #[arg(long)]
    strict_handshake: bool,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,js5d=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("js5d v{}", js5d::VERSION);
    tracing::info!("Cache directory: {}", args.cache_dir.display());
    tracing::info!("Revision: {}", args.revision);

    let config = Config::builder()
        .cache_dir(&args.cache_dir)
        .revision(args.revision)
        .listen_addr(&args.listen)
        .strict_handshake(args.strict_handshake)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Descriptor ready ({} indices, {} reference tables)",
        engine.descriptor().index_count(),
        engine.store().entry_count(META_INDEX)
    );

    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
