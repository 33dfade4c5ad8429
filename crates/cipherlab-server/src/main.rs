//! Cipherlab Server - TCP JSON server for the cipher, solver and stego engines.
//!
//! Prints `LISTEN_PORT=<port>` on stdout once the socket is bound, then runs
//! until interrupted.

mod server;

use anyhow::Result;
use cipherlab_core::{ServerConfig, StegoConfig, StegoLimits};
use clap::Parser;
use server::ServerSettings;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cipherlab-server")]
#[command(about = "TCP JSON server for cipherlab")]
struct Args {
    /// Port to listen on (0 = auto-assign)
    #[arg(short, long, default_value_t = ServerConfig::DEFAULT_PORT)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = ServerConfig::DEFAULT_HOST)]
    host: String,

    /// SQLite database holding user accounts
    #[arg(long, default_value = ServerConfig::DEFAULT_DATABASE)]
    database: PathBuf,

    /// Minimum image width and height for steganography
    #[arg(long, default_value_t = StegoConfig::DEFAULT_MIN_SIDE)]
    min_image_side: u32,

    /// Minimum image pixel count for steganography
    #[arg(long, default_value_t = StegoConfig::DEFAULT_MIN_PIXELS)]
    min_image_pixels: u64,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    info!("Starting cipherlab server");

    let settings = ServerSettings {
        host: args.host,
        port: args.port,
        database: args.database,
        stego_limits: StegoLimits::new(args.min_image_side, args.min_image_pixels),
    };

    let mut handle = server::start_server(&settings).await?;

    // Machine-readable port line for launchers and tests
    println!("LISTEN_PORT={}", handle.port);

    info!("Server running on {}", handle.addr());

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");
    handle.shutdown();

    Ok(())
}
