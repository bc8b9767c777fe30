//! Reads request paths from stdin, one per line, and fetches each over a
//! single persistent connection. Prints one status line per response on
//! stdout; diagnostics go to stderr.

use std::path::PathBuf;

use clap::Parser;
use ferry::client::Client;
use ferry::client::encoder::path_from_line;
use ferry::config::Config;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Fetch files from a ferry server, one path per stdin line.
#[derive(Parser, Debug)]
#[command(name = "ferry-client")]
#[command(version, about)]
struct Args {
    /// Server host name or address
    host: String,

    /// Server port
    port: u16,

    /// YAML configuration file (falls back to $FERRY_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for retrieved files, overriding the configuration
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries the status lines; logs must stay off it.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.output_dir {
        cfg.client.output_dir = dir;
    }

    let mut client = Client::new(args.host, args.port, &cfg.client);
    // Raw lines: a byte sequence that is not UTF-8 is still a request.
    let mut lines = BufReader::new(tokio::io::stdin()).split(b'\n');

    while let Some(line) = lines.next_segment().await? {
        let path = path_from_line(&line);
        let result = client
            .fetch_with(&path, |response| println!("{}", response.status_line()))
            .await;

        if let Err(e) = result {
            tracing::error!(path = %path, error = %e, "Request failed");
        }
    }

    tracing::debug!(
        connections = client.connection_manager().connections_opened(),
        "Input exhausted"
    );

    Ok(())
}
