//! Command line front end for the region matchmaker
//!
//! Probes the configured regions, resolves a selection the same way a client
//! session does, and optionally asks the selected region for a game.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use region_matchmaker::config::AppConfig;
use region_matchmaker::service::{AppState, PlayOutcome};
use region_matchmaker::types::TeamSize;
use region_matchmaker::utils::display_count;
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TeamArg {
    Solo,
    Duo,
}

impl From<TeamArg> for TeamSize {
    fn from(team: TeamArg) -> Self {
        match team {
            TeamArg::Solo => TeamSize::Solo,
            TeamArg::Duo => TeamSize::Duo,
        }
    }
}

/// Region Matchmaker - probe regions, pick the best one, join a game
#[derive(Parser)]
#[command(
    name = "region-matchmaker",
    version,
    about = "Probe game regions, select the best one and request a game",
    long_about = "Region Matchmaker probes every configured deployment region, selects the \
                 lowest-latency one (or the persisted preference / configured default), and can \
                 request a game from it, printing the WebSocket endpoint to connect to."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Settings file override
    #[arg(long, value_name = "FILE", help = "Persist settings to this JSON file")]
    settings: Option<PathBuf>,

    /// Region to select explicitly
    #[arg(long, value_name = "ID", help = "Select this region after probing")]
    region: Option<String>,

    /// Debug overrides
    #[arg(
        long,
        value_name = "STRING",
        help = "Apply debug overrides from a query string (nameColor, lobbyClearing, password, role)"
    )]
    query: Option<String>,

    /// Only probe and select
    #[arg(long, help = "Probe and select a region without requesting a game")]
    probe_only: bool,

    /// Team size to play
    #[arg(long, value_enum, value_name = "SIZE", help = "Request a game for this team size")]
    team: Option<TeamArg>,

    /// Dump metrics at exit
    #[arg(long, help = "Print Prometheus metrics before exiting")]
    print_metrics: bool,

    /// Dry run mode (validate config and exit)
    #[arg(long, help = "Validate configuration and exit without probing")]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Display startup banner with client information
fn display_startup_banner(config: &AppConfig) {
    info!("Region Matchmaker");
    info!("   Client: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    info!("   Protocol version: {}", config.matchmaking.protocol_version);
    info!(
        "   Regions: {} (default {})",
        config.regions.regions.len(),
        config.regions.default_region
    );
    info!(
        "   Timeouts: probe {}ms, join {}ms, cooldown {}ms",
        config.matchmaking.probe_timeout_ms,
        config.matchmaking.join_timeout_ms,
        config.matchmaking.join_cooldown_ms
    );
    match &config.service.settings_file {
        Some(path) => info!("   Settings: {}", path.display()),
        None => info!("   Settings: in memory"),
    }
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    if let Some(settings) = &args.settings {
        config.service.settings_file = Some(settings.clone());
    }

    region_matchmaker::config::validate_config(&config)?;
    Ok(config)
}

async fn print_regions(state: &AppState) -> Result<()> {
    println!("Regions:");
    for item in state.region_list().await {
        println!(
            "  {} {:<4} {:<20} {:>6} players {:>8}{}",
            if item.selected { "*" } else { " " },
            item.id,
            item.name,
            display_count(item.player_count),
            item.latency_ms
                .map(|ms| format!("{}ms", ms))
                .unwrap_or_else(|| "-".to_string()),
            if item.disabled { "  (unavailable)" } else { "" }
        );
    }
    println!("Selected: {}", state.selector_view().await?);
    Ok(())
}

async fn run(args: &Args, state: &AppState) -> Result<bool> {
    if let Some(query) = &args.query {
        let applied = state.apply_query_overrides(query)?;
        if applied.strip_query {
            info!("Query carried credentials; do not reuse it in shared links");
        }
    }

    if let Some(refresh) = state.initialize().await? {
        // The CLI prints live stats, so wait for the background sweep here
        if let Err(e) = refresh.await {
            warn!("Background refresh failed: {}", e);
        }
    }

    if let Some(region) = &args.region {
        state.select_region(region).await?;
    }

    print_regions(state).await?;

    let team = match args.team {
        Some(team) if !args.probe_only => TeamSize::from(team),
        _ => return Ok(true),
    };

    let result = state.play(team).await;
    match result.outcome {
        PlayOutcome::Connect(target) => {
            println!("Game {}: {}", target.game_id, target.url);
            Ok(true)
        }
        PlayOutcome::Notice(notice) => {
            if let Some(title) = notice.title {
                println!("{}", title);
            }
            println!("{}", notice.message);
            if notice.requires_acknowledgment() {
                println!("(acknowledgment required before the next attempt)");
            }
            Ok(false)
        }
        PlayOutcome::Refused(e) => {
            println!("Join refused: {}", e);
            Ok(false)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration (CLI args can override environment/config file)
    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without probing");
        return Ok(());
    }

    display_startup_banner(&config);

    let state = match AppState::new(config) {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize session: {}", e);
            std::process::exit(1);
        }
    };

    let succeeded = match run(&args, &state).await {
        Ok(succeeded) => succeeded,
        Err(e) => {
            error!("{:#}", e);
            false
        }
    };

    if args.print_metrics {
        match state.metrics().gather_text() {
            Ok(text) => print!("{}", text),
            Err(e) => warn!("Failed to render metrics: {}", e),
        }
    }

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
