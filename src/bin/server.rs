//! # Server Binary Entry Point
//!
//! Thin wrapper that loads configuration and runs the poll server.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin server -- --config config/server.toml
//! cargo run --bin server -- --duration-secs 120
//! ```
//!
//! The server will:
//! 1. Load configuration from the given TOML file (or use defaults)
//! 2. Bind the control listener and the broadcast socket
//! 3. Open the voting window and start its timer
//! 4. Accept control connections until killed

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

use poll_coordinator::server::{PollServer, ServerConfig};

/// Command-line arguments for the server binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the server configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the voting window duration from the config file
    #[arg(long)]
    duration_secs: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Initialize the logging system with timestamp, level, and message formatting.
///
/// Format: `[HH:MM:SS] [LEVEL] message`
fn init_logger(level: LevelFilter) {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.log_level.parse().unwrap_or(LevelFilter::Info));

    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };
    if let Some(duration) = args.duration_secs {
        config.voting.duration_secs = duration;
    }

    // Failing to bind either socket is the only fatal error
    let server = PollServer::bind(config).await?;
    server.run().await;

    Ok(())
}
