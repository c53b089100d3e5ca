//! Stub Region Server
//!
//! Serves the two region endpoints locally so the matchmaker can be pointed
//! at a machine without a real deployment.
//!
//! Usage:
//!   cargo run --bin region-stub -- --port 8001 --player-count 12
//!   cargo run --bin region-stub -- --port 8002 --reject tempBan
//!   cargo run --bin region-stub -- --port 8003 --protocol-version 22 --delay-ms 300

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use region_matchmaker::stub::{StubConfig, StubServer};
use region_matchmaker::types::{RejectionReason, TeamSize};
use tokio::signal;
use tracing::info;

#[derive(Parser)]
#[command(name = "region-stub")]
#[command(about = "Local stand-in for a game region's HTTP API")]
struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8001")]
    port: u16,

    /// Protocol version reported by /api/serverInfo
    #[arg(long, default_value = "23")]
    protocol_version: u32,

    /// Player count reported by /api/serverInfo
    #[arg(long)]
    player_count: Option<u32>,

    /// Largest team size (1 or 2)
    #[arg(long, value_parser = parse_team_size)]
    max_team_size: Option<TeamSize>,

    /// Refuse every join (rateLimit, warning, tempBan, permaBan, unspecified)
    #[arg(long, value_parser = parse_reason)]
    reject: Option<RejectionReason>,

    /// Answer joins with a non-JSON body
    #[arg(long)]
    malformed_join: bool,

    /// Delay added to every response in milliseconds
    #[arg(long, default_value = "0")]
    delay_ms: u64,
}

fn parse_team_size(value: &str) -> Result<TeamSize, String> {
    let players: u8 = value
        .parse()
        .map_err(|_| format!("Invalid team size: {}", value))?;
    TeamSize::try_from(players)
}

fn parse_reason(value: &str) -> Result<RejectionReason, String> {
    if value == "unspecified" {
        return Ok(RejectionReason::Unspecified);
    }
    match RejectionReason::from_code(Some(value)) {
        RejectionReason::Unspecified => Err(format!(
            "Unknown rejection reason '{}'. Use rateLimit, warning, tempBan, permaBan or unspecified",
            value
        )),
        reason => Ok(reason),
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = signal::ctrl_c() => result?,
            _ = terminate.recv() => info!("Received SIGTERM signal"),
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = StubConfig {
        host: cli.host,
        port: cli.port,
        protocol_version: cli.protocol_version,
        player_count: cli.player_count,
        max_team_size: cli.max_team_size,
        reject: cli.reject,
        malformed_join: cli.malformed_join,
        delay: Duration::from_millis(cli.delay_ms),
        ..StubConfig::default()
    };

    info!(
        "Stub region: protocol {}, players {:?}, team size {:?}, reject {:?}, delay {:?}",
        config.protocol_version, config.player_count, config.max_team_size, config.reject, config.delay
    );

    let server = Arc::new(StubServer::new(config));
    let (addr, handle) = server.clone().spawn().await?;
    info!("Point a region at {} (https = false)", addr);

    wait_for_shutdown_signal().await?;
    info!("Shutting down stub region");
    server.stop();
    handle.await?;

    Ok(())
}
