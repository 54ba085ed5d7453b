//! Command-line interface definitions.
//!
//! Flags override the values of the configuration file; API keys can also be
//! supplied through the environment.

use chrono::NaiveDate;
use clap::Parser;

/// Collect news articles matching keywords within a date range.
///
/// # Examples
///
/// ```sh
/// # Every provider, default configuration
/// news_scraper --from 2014-01-01 --to 2014-01-31 -j ./json Snowden NSA
///
/// # Selected providers with a configuration file
/// news_scraper --from 2014-01-01 --to 2014-01-31 -j ./json -c config.yaml \
///     -p guardian,spiegel-online "Edward Snowden"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// First day of the search range (YYYY-MM-DD)
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day of the search range, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: NaiveDate,

    /// Output directory for the JSON file
    #[arg(short, long)]
    pub json_output_dir: String,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Providers to query, comma separated; overrides the configuration file
    #[arg(short, long, value_delimiter = ',')]
    pub providers: Vec<String>,

    /// Articles populated concurrently per provider
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// The Guardian content API key
    #[arg(long, env = "GUARDIAN_API_KEY")]
    pub guardian_api_key: Option<String>,

    /// Die Zeit content API key
    #[arg(long, env = "ZEIT_API_KEY")]
    pub zeit_api_key: Option<String>,

    /// Search terms; an article matching several is reported once
    #[arg(required = true)]
    pub keywords: Vec<String>,
}
