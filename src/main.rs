//! Mesh Keys - Main Application
//!
//! Reads the environment once, registers the key and forward routes, and serves.

use clap::Parser;
use mesh_keys::{config::Snapshot, server::start_server};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Mesh Keys - static key lookups and request forwarding
#[derive(Parser)]
#[command(name = "mesh-keys")]
#[command(about = "Serves configured keys and forwards requests to configured upstreams")]
#[command(version)]
struct Cli {
    /// Server port (overrides PORT)
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("mesh_keys={},tower_http={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut snapshot = Snapshot::from_env()?;
    if let Some(port) = cli.port {
        snapshot.server.port = port;
    }

    tracing::info!(
        keys = %snapshot.keys.len(),
        forwards = %snapshot.forwards.len(),
        "Starting mesh-keys server"
    );
    start_server(snapshot).await?;

    Ok(())
}
