#![forbid(unsafe_code)]
//! Serves the bridge over stdin/stdout, one JSON command per line.

use chaintube::bridge::Bridge;
use chaintube::config::{load_config, TubeConfig};
use chaintube::server::handle_line;
use clap::Parser;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, Level};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML config file; defaults to $CHAINTUBE_CONFIG or ./chaintube.toml
    #[arg(long)]
    config: Option<PathBuf>,
    /// Log level written to stderr (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: Level,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => TubeConfig::from_file(path)?,
        None => load_config()?,
    };
    info!("chaintube bridge serving chain {}", config.chain_id);
    let bridge = Bridge::new(config);

    // Panics are reported as replies; keep the default hook's stderr noise out of the way.
    std::panic::set_hook(Box::new(|_| {}));

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let reply = handle_line(&bridge, &line);
        writeln!(stdout, "{}", reply)?;
        stdout.flush()?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
