//! Export of run results.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2014-01-01_2014-01-31.json
//! ```

use crate::dates::DateRange;
use crate::errors::ExportError;
use crate::models::RunResult;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::path::PathBuf;

pub mod json;

pub use json::JsonExporter;

/// Everything an exporter writes about one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub range: DateRange,
    pub keywords: Vec<String>,
    pub results: RunResult,
}

impl RunReport {
    pub fn new(range: DateRange, keywords: Vec<String>, results: RunResult) -> Self {
        Self {
            generated_at: Utc::now(),
            range,
            keywords,
            results,
        }
    }

    pub fn article_count(&self) -> usize {
        self.results.values().map(|articles| articles.len()).sum()
    }
}

/// Writes a [`RunReport`] somewhere durable.
pub trait Exporter {
    /// Writes `report` and returns where it went.
    fn export(&self, report: &RunReport) -> impl Future<Output = Result<PathBuf, ExportError>> + Send;
}
