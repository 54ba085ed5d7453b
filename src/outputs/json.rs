//! JSON output.
//!
//! One file per run, named after the date range:
//! `{json_output_dir}/{from}_{to}.json`. Articles are grouped by provider and
//! sorted by URL so that repeated runs produce comparable files.

use super::{Exporter, RunReport};
use crate::errors::ExportError;
use crate::models::Article;
use crate::providers::ProviderId;
use chrono::{DateTime, NaiveDate, Utc};
use itertools::Itertools;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

#[derive(Serialize)]
struct Document<'a> {
    generated_at: DateTime<Utc>,
    from: NaiveDate,
    to: NaiveDate,
    keywords: &'a [String],
    article_count: usize,
    providers: BTreeMap<ProviderId, Vec<&'a Article>>,
}

impl<'a> Document<'a> {
    fn new(report: &'a RunReport) -> Self {
        let providers = report
            .results
            .iter()
            .map(|(id, articles)| {
                let sorted = articles
                    .values()
                    .sorted_by(|a, b| a.url().cmp(b.url()))
                    .collect();
                (*id, sorted)
            })
            .collect();
        Self {
            generated_at: report.generated_at,
            from: report.range.first_day(),
            to: report.range.last_day(),
            keywords: &report.keywords,
            article_count: report.article_count(),
            providers,
        }
    }
}

/// Writes run reports as pretty-printed JSON into a directory.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    dir: PathBuf,
}

impl JsonExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The file a report for `report`'s date range is written to.
    pub fn path_for(&self, report: &RunReport) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.json",
            report.range.first_day(),
            report.range.last_day()
        ))
    }
}

impl Exporter for JsonExporter {
    #[instrument(level = "info", skip_all, fields(dir = %self.dir.display()))]
    async fn export(&self, report: &RunReport) -> Result<PathBuf, ExportError> {
        let json = serde_json::to_string_pretty(&Document::new(report))?;

        if let Err(e) = fs::create_dir_all(&self.dir).await {
            error!(error = %e, "Failed to create JSON dir");
            return Err(ExportError::Io {
                path: self.dir.display().to_string(),
                source: e,
            });
        }

        let path = self.path_for(report);
        info!(path = %path.display(), articles = report.article_count(), "Writing JSON");
        fs::write(&path, json).await.map_err(|source| ExportError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "Wrote JSON file");

        Ok(path)
    }
}
