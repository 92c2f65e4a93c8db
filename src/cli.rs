//! CLI definition and dispatch.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::env_config_adapter::EnvConfigAdapter;
use crate::adapters::file_archive::FileArchive;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::gist_publisher::GistPublisher;
use crate::adapters::http::RetryPolicy;
use crate::adapters::replay_source::ReplaySource;
use crate::adapters::stdout_publisher::StdoutPublisher;
use crate::adapters::taapi_source::TaapiSource;
use crate::domain::bar::BarSeries;
use crate::domain::config_validation::validate_feed_config;
use crate::domain::decision::decide;
use crate::domain::error::FeedError;
use crate::domain::gap_fill::fill_gaps;
use crate::domain::indicator::{IndicatorRequest, TREND_EMA};
use crate::domain::merge::{MergeTarget, merge_records};
use crate::domain::settings::FeedConfig;
use crate::domain::snapshot::{Snapshot, SnapshotInput, build_snapshot};
use crate::domain::trend::TrendContext;
use crate::ports::indicator_source::{FetchRequest, IndicatorSource};
use crate::ports::publisher::{Publisher, SnapshotArchive};

#[derive(Parser, Debug)]
#[command(name = "biasfeed", about = "Indicator feed and trading-bias snapshot publisher")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch indicators, decide the bias and publish a snapshot
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Read indicator batches from a JSON fixture instead of the API
        #[arg(long)]
        replay: Option<PathBuf>,
        /// Print the snapshot to stdout; nothing is archived or uploaded
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a feed configuration and list the indicator requests
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Result of one successful pipeline run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub snapshot: Snapshot,
    pub location: String,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Run {
            config,
            replay,
            dry_run,
        } => run_feed(&config, replay.as_deref(), dry_run),
        Command::Validate { config } => run_validate(&config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}: {e}", e.stage());
            (&e).into()
        }
    }
}

/// Loads an INI file with the environment overlaid on top of it.
pub fn load_config(path: &Path) -> Result<EnvConfigAdapter<FileConfigAdapter>, FeedError> {
    let file = FileConfigAdapter::from_file(path)?;
    Ok(EnvConfigAdapter::from_env(file))
}

/// Builds and validates the run configuration.
pub fn build_feed_config(adapter: &EnvConfigAdapter<FileConfigAdapter>) -> Result<FeedConfig, FeedError> {
    let config = FeedConfig::from_port(adapter)?;
    validate_feed_config(&config)?;
    Ok(config)
}

fn require_secret<'a>(
    adapter: &'a EnvConfigAdapter<FileConfigAdapter>,
    section: &str,
    var: &str,
) -> Result<&'a str, FeedError> {
    adapter.var(var).ok_or_else(|| FeedError::ConfigMissing {
        section: section.to_string(),
        key: var.to_string(),
    })
}

fn run_feed(config_path: &Path, replay: Option<&Path>, dry_run: bool) -> Result<(), FeedError> {
    // Stage 1: Load and validate config
    tracing::info!(path = %config_path.display(), "loading config");
    let adapter = load_config(config_path)?;
    let config = build_feed_config(&adapter)?;

    // Stage 2: Wire the indicator source
    let source: Box<dyn IndicatorSource> = match replay {
        Some(path) => Box::new(ReplaySource::from_file(path)?),
        None => {
            let secret = require_secret(&adapter, "source", &config.source.secret_env)?;
            Box::new(TaapiSource::new(&config.source, secret.to_string())?)
        }
    };

    // Stage 3: Wire the publisher and archive
    let publisher: Box<dyn Publisher> = if dry_run {
        Box::new(StdoutPublisher)
    } else {
        let gist_id = config
            .publisher
            .gist_id
            .clone()
            .ok_or_else(|| FeedError::ConfigMissing {
                section: "publisher".into(),
                key: "gist_id".into(),
            })?;
        let token = require_secret(&adapter, "publisher", &config.publisher.token_env)?;
        Box::new(GistPublisher::new(
            &config.publisher.api_base,
            gist_id,
            token.to_string(),
            config.file_name.clone(),
            config.source.timeout,
            RetryPolicy {
                max_attempts: config.source.max_attempts,
                delay: config.source.retry_delay,
            },
        )?)
    };
    let archive = match (&config.history_dir, dry_run) {
        (Some(dir), false) => Some(FileArchive::new(dir.clone())),
        _ => None,
    };

    let outcome = run_feed_pipeline(
        source.as_ref(),
        publisher.as_ref(),
        archive.as_ref().map(|a| a as &dyn SnapshotArchive),
        &config,
        Utc::now(),
    )?;

    if !dry_run {
        println!("{}", outcome.location);
    }
    Ok(())
}

/// Fetches one timeframe and merges it into a series.
pub fn fetch_series(
    source: &dyn IndicatorSource,
    config: &FeedConfig,
    timeframe: &str,
    indicators: Vec<IndicatorRequest>,
) -> Result<BarSeries, FeedError> {
    let request = FetchRequest {
        exchange: config.exchange.clone(),
        symbol: config.symbol.clone(),
        timeframe: timeframe.to_string(),
        indicators,
        results: config.limit,
    };
    let records = source.fetch(&request)?;
    tracing::info!(timeframe, records = records.len(), "fetched indicator batch");
    merge_records(
        &records,
        config.limit,
        MergeTarget {
            symbol: &config.symbol,
            timeframe,
        },
    )
}

/// Runs fetch through publish against the given collaborators.
///
/// Nothing reaches the archive or the publisher unless every earlier stage
/// succeeded.
pub fn run_feed_pipeline(
    source: &dyn IndicatorSource,
    publisher: &dyn Publisher,
    archive: Option<&dyn SnapshotArchive>,
    config: &FeedConfig,
    now: DateTime<Utc>,
) -> Result<RunOutcome, FeedError> {
    // Stage 4: Fetch and merge the trigger timeframe
    let mut series = fetch_series(
        source,
        config,
        &config.trigger_tf,
        config.mode.trigger_requests(),
    )?;

    // Stage 5: Gap fill
    let filled = fill_gaps(&mut series, &config.fill_keys, config.fill_mode);
    tracing::info!(bars = series.len(), filled, "trigger series ready");

    // Stage 6: Trend timeframe
    let trend = if config.mode.uses_trend_timeframe() {
        let mut trend_series = fetch_series(
            source,
            config,
            &config.trend_tf,
            config.mode.trend_requests(),
        )?;
        fill_gaps(&mut trend_series, &[TREND_EMA.to_string()], config.fill_mode);
        let context = TrendContext::from_series(&trend_series, TREND_EMA);
        if context.is_none() {
            tracing::warn!(timeframe = %config.trend_tf, "trend EMA unavailable on freshest bar");
        }
        context
    } else {
        None
    };

    // Stage 7: Decide
    let fresh = series.last().ok_or_else(|| FeedError::NoUsableData {
        symbol: config.symbol.clone(),
        timeframe: config.trigger_tf.clone(),
    })?;
    let decision = decide(fresh, trend.as_ref(), &config.mode);
    tracing::info!(bias = %decision.bias, reason = %decision.reason, "decision");

    // Stage 8: Snapshot
    let snapshot = build_snapshot(SnapshotInput {
        config,
        series: &series,
        trend: trend.as_ref(),
        decision,
        generated_at: now,
    })?;

    // Stage 9: Archive, then publish
    if let Some(archive) = archive {
        archive.append(&snapshot)?;
    }
    let location = publisher.publish(&snapshot)?;
    tracing::info!(location = %location, "published snapshot");

    Ok(RunOutcome { snapshot, location })
}

fn run_validate(config_path: &Path) -> Result<(), FeedError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    let config = build_feed_config(&adapter)?;

    eprintln!("\nMode: {}", config.mode.name());
    eprintln!("Symbol: {} on {}", config.symbol, config.exchange);

    eprintln!("\nTrigger timeframe ({}):", config.trigger_tf);
    for request in config.mode.trigger_requests() {
        eprintln!("  {request}");
    }

    if config.mode.uses_trend_timeframe() {
        eprintln!("\nTrend timeframe ({}):", config.trend_tf);
        for request in config.mode.trend_requests() {
            eprintln!("  {request}");
        }
    }

    eprintln!("\nFeed configuration is valid.");
    Ok(())
}
