//! js5 CLI Client
//!
//! Command-line interface for talking to a js5d server.

use std::io::BufReader;
use std::net::TcpStream;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use js5d::protocol::{
    read_chunked, read_handshake_status, write_request, FileRequest, FileResponse,
    HandshakeStatus, Priority, Request,
};
use js5d::{GlobalDescriptor, Js5Error, Result};

/// js5 CLI
#[derive(Parser, Debug)]
#[command(name = "js5-cli")]
#[command(about = "CLI for js5d file servers")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = js5d::config::DEFAULT_LISTEN_ADDR)]
    server: String,

    /// Revision to present in the handshake
    #[arg(short, long)]
    revision: u32,

    /// Give up on a response after this many milliseconds (0 = wait forever)
    #[arg(short, long, default_value = "5000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the checksum and revision of every index
    Descriptor,

    /// Fetch one entry
    Fetch {
        /// Index id
        index: u8,

        /// Entry id
        entry: u16,

        /// Write the container here instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let stream = TcpStream::connect(&args.server)?;
    if args.timeout_ms > 0 {
        stream.set_read_timeout(Some(Duration::from_millis(args.timeout_ms)))?;
    }
    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);

    write_request(&mut writer, &Request::Handshake { revision: args.revision })?;
    if read_handshake_status(&mut reader)? != HandshakeStatus::Ok {
        return Err(Js5Error::Protocol(format!(
            "server rejected revision {}",
            args.revision
        )));
    }

    match args.command {
        Commands::Descriptor => {
            let (index, entry) = FileRequest::DESCRIPTOR;
            let response = fetch(&mut reader, &mut writer, index, entry)?;
            let descriptor = GlobalDescriptor::parse(&response.container)?;

            println!("{:>5}  {:>8}  {:>8}", "index", "crc", "revision");
            for (index, entry) in descriptor.entries().enumerate() {
                println!("{:>5}  {:08x}  {:>8}", index, entry.crc, entry.revision);
            }
        }
        Commands::Fetch {
            index,
            entry,
            output,
        } => {
            let response = fetch(&mut reader, &mut writer, index, entry)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, &response.container)?;
                    println!(
                        "Wrote {} bytes to {}",
                        response.container.len(),
                        path.display()
                    );
                }
                None => println!(
                    "{}/{}: {} bytes, compression {}",
                    response.index,
                    response.entry,
                    response.container.len(),
                    response.container[0]
                ),
            }
        }
    }

    Ok(())
}

/// Send one urgent request and wait for its response
///
/// The server sends nothing for missing entries, so a timeout is reported
/// as a missing entry.
fn fetch(
    reader: &mut BufReader<TcpStream>,
    writer: &mut TcpStream,
    index: u8,
    entry: u16,
) -> Result<FileResponse> {
    let request = FileRequest::new(index, entry, Priority::Urgent);
    write_request(writer, &Request::File(request))?;
    read_chunked(reader).map_err(|e| {
        if e.is_timeout() {
            Js5Error::EntryNotFound {
                index,
                entry: entry as u32,
            }
        } else {
            e
        }
    })
}
