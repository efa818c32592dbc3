use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uic_sync::config::AppConfig;
use uic_sync::fetch::{Fetcher, FetcherConfig};
use uic_sync::parse_duration;
use uic_sync::sync::primebot::PrimeBotSource;
use uic_sync::sync::riot::{RiotEndpoints, RiotSource};
use uic_sync::sync::{exit_code, RunContext, SyncEngine, SyncReport, EXIT_NOTHING_SYNCED};

#[derive(Parser)]
#[command(name = "uic-sync")]
#[command(about = "Sync Ultra Instinct Crew standings and player ranks into JSON caches")]
#[command(version)]
struct Cli {
    /// Path to configuration file (built-in defaults if missing)
    #[arg(long, default_value = "./uic-sync.toml")]
    config: PathBuf,

    /// Directory to write the JSON caches to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Which caches to refresh
    #[arg(long, value_enum, default_value_t = Target::All)]
    only: Target,

    /// Delay between upstream requests (e.g. "1200ms", "2s")
    #[arg(long)]
    delay: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Target {
    All,
    Teams,
    Players,
}

impl Target {
    fn teams(self) -> bool {
        matches!(self, Target::All | Target::Teams)
    }

    fn players(self) -> bool {
        matches!(self, Target::All | Target::Players)
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(&cli.config);
    let level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().ok().map(|c| c.log_level.clone()))
        .unwrap_or_else(|| "info".to_string());
    init_tracing(&level, cli.json_logs);

    info!("Starting uic-sync v{}", env!("CARGO_PKG_VERSION"));

    let config = match config.with_context(|| format!("loading config from {}", cli.config.display())) {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(config, cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(mut config: AppConfig, cli: Cli) -> Result<ExitCode> {
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }

    let delay = match cli.delay.as_deref() {
        Some(s) => parse_duration(s).with_context(|| format!("invalid --delay value: {}", s))?,
        None => Duration::from_millis(config.sync.request_delay_ms),
    };

    // Read once, before any request is made.
    let riot_key = config.riot_api_key(cli.only.players(), |name| std::env::var(name).ok())?;
    let players = config.player_configs();

    let engine = SyncEngine::new(delay);
    let ctx = RunContext::new();
    let mut reports: Vec<SyncReport> = Vec::new();

    if cli.only.teams() {
        let fetcher = Fetcher::new(FetcherConfig::from(&config.sync))?;
        let source = PrimeBotSource::new(fetcher, config.primebot.base_url.clone(), config.rules.clone());
        let report = engine
            .sync_file(&source, &config.teams, &config.teams_output_path(), &ctx)
            .await
            .context("team sync")?;
        reports.push(report);
    }

    if let Some(key) = riot_key {
        let endpoints = RiotEndpoints {
            account_base_url: config.riot.account_base_url.clone(),
            platform_base_url: config.riot.platform_base_url.clone(),
            ddragon_version: config.riot.ddragon_version.clone(),
        };
        let source = RiotSource::new(FetcherConfig::from(&config.sync), &key, endpoints)?;
        let report = engine
            .sync_file(&source, &players, &config.players_output_path(), &ctx)
            .await
            .context("player sync")?;
        reports.push(report);
    }

    for report in &reports {
        info!(
            "{}: {:?} ({} synced, {} failed, {} skipped, persisted: {})",
            report.source, report.status, report.succeeded, report.failed, report.skipped, report.persisted
        );
        for err in &report.errors {
            warn!("  {}", err);
        }
    }

    let code = exit_code(&reports);
    if code == EXIT_NOTHING_SYNCED {
        warn!("At least one source synced nothing; previous caches kept");
    }

    Ok(ExitCode::from(code))
}
