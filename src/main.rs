//! # news_scraper
//!
//! Collects news articles matching a set of keywords within a date range
//! from English and German news providers, and writes them as one JSON file.
//!
//! ## Usage
//!
//! ```sh
//! news_scraper --from 2014-01-01 --to 2014-01-31 -j ./json Snowden NSA
//! ```
//!
//! ## Architecture
//!
//! Every provider runs the same pipeline, concurrently with the others:
//! 1. **Discovery**: page through the provider's search (HTML or JSON API)
//!    for each keyword, merging hits by URL
//! 2. **Pre-filter**: drop unwanted candidates by URL
//! 3. **Population**: fetch article pages in parallel and extract subtitle,
//!    body and publication date
//! 4. **Post-filter**: drop records outside the date range or otherwise unfit
//! 5. **Output**: write all providers' articles to a JSON file

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod discovery;
mod errors;
mod extract;
mod fetch;
mod filters;
mod models;
mod orchestrator;
mod outputs;
mod populate;
mod providers;
mod utils;

use cli::Cli;
use config::Config;
use dates::DateRange;
use errors::ConfigError;
use orchestrator::Orchestrator;
use outputs::{Exporter, JsonExporter, RunReport};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_scraper starting up");

    let args = Cli::parse();
    debug!(?args.from, ?args.to, ?args.keywords, json_output_dir = %args.json_output_dir, "Parsed CLI arguments");

    let config = effective_config(&args)?;
    let range = DateRange::new(args.from, args.to)?;
    let providers = providers::build_selected(&config)?;
    info!(
        providers = providers.len(),
        workers = config.workers,
        from = %range.first_day(),
        to = %range.last_day(),
        "Configuration ready"
    );

    // Early check: ensure JSON output dir is writable
    if let Err(e) = ensure_writable_dir(&args.json_output_dir).await {
        error!(
            path = %args.json_output_dir,
            error = %e,
            "JSON output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let orchestrator = Orchestrator::new(config, providers)?;
    info!(providers = ?orchestrator.provider_ids(), "Starting run");
    let results = orchestrator.run(&args.keywords, &range).await;
    for (provider, articles) in &results {
        info!(%provider, articles = articles.len(), "Provider result");
    }

    let report = RunReport::new(range, args.keywords.clone(), results);
    let exporter = JsonExporter::new(&args.json_output_dir);
    match exporter.export(&report).await {
        Ok(path) => info!(path = %path.display(), articles = report.article_count(), "Export complete"),
        Err(e) => {
            error!(error = %e, "Failed to write JSON");
            return Err(e.into());
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// The configuration file, if any, with command-line overrides applied.
fn effective_config(args: &Cli) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if !args.providers.is_empty() {
        config.providers = args.providers.clone();
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    if let Some(key) = &args.guardian_api_key {
        config.api_keys.guardian = Some(key.clone());
    }
    if let Some(key) = &args.zeit_api_key {
        config.api_keys.zeit = Some(key.clone());
    }

    config.validate()?;
    Ok(config)
}
