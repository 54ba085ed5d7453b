//! Error types for every stage of the acquisition pipeline.
//!
//! Only [`ConfigError`] and [`ExportError`] ever reach `main`. Fetch, parse
//! and population errors are logged and swallowed at the granularity of the
//! page or candidate that produced them.

use thiserror::Error;

/// Failure of a single HTTP round trip.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// A date string that did not match the provider's format.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("cannot parse {input:?} with format {format:?}: {reason}")]
pub struct DateParseError {
    pub input: String,
    pub format: String,
    pub reason: String,
}

/// Problems detected while assembling configuration and providers. Fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown provider: {0}")]
    UnknownProvider(String),

    #[error("provider {provider} requires parameter {parameter}")]
    MissingParameter {
        provider: &'static str,
        parameter: &'static str,
    },

    #[error("invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("invalid url pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid date range: {from} is after {to}")]
    InvalidDateRange {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("HTTP client setup failed: {0}")]
    Client(#[source] reqwest::Error),
}

/// Failure writing the run result.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
