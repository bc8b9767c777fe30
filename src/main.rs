use std::path::PathBuf;

use clap::Parser;
use ferry::config::Config;
use ferry::server::listener;
use tracing_subscriber::EnvFilter;

/// Serve files over persistent HTTP/1.1 connections.
#[derive(Parser, Debug)]
#[command(name = "ferry-server")]
#[command(version, about)]
struct Args {
    /// YAML configuration file (falls back to $FERRY_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration
    #[arg(short, long)]
    listen: Option<String>,

    /// Directory to serve, overriding the configuration
    #[arg(short, long)]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let mut cfg = Config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        cfg.server.listen_addr = listen;
    }
    if let Some(root) = args.root {
        cfg.server.root = root;
    }

    tokio::select! {
        res = listener::run(&cfg.server) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
