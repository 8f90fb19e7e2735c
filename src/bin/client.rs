//! # Client Binary Entry Point
//!
//! Interactive poll client.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin client -- --config config/client.toml
//! cargo run --bin client -- --server 192.168.0.10:50007
//! ```
//!
//! Two tasks run side by side: the note listener prints every broadcast note,
//! and the menu drives the control channel one request at a time.

use clap::Parser;
use env_logger::Builder;
use log::{warn, LevelFilter};
use std::io::Write;

use poll_coordinator::client::{ClientConfig, ControlClient, Menu, NoteListener, Prompt};

/// Command-line arguments for the client binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the client configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Override the server control address
    #[arg(long)]
    server: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

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
        Some(path) => ClientConfig::from_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(server) = args.server {
        config.client.server_address = server;
    }

    // Notes are best-effort; the menu still works without them
    match NoteListener::join(&config.broadcast).await {
        Ok(listener) => {
            tokio::spawn(listener.run());
        }
        Err(e) => warn!("⚠️  Could not join note group: {}", e),
    }

    let client = match ControlClient::connect(&config.client.server_address).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!(
                "Error: could not connect to server at {}: {}",
                config.client.server_address, e
            );
            return Ok(());
        }
    };
    println!("Connected to {}", config.client.server_address);

    Menu::new(client, Prompt::stdin()).run().await
}
