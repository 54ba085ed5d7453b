//! Candidate discovery.
//!
//! A provider finds candidate articles in one of three ways:
//! - [`PredictiveSearch`]: the address of every search page can be computed
//!   from keyword, date range and offset
//! - [`ReactiveSearch`]: the address of the next page is read from the
//!   current one
//! - [`ApiSearch`]: a JSON search API paged by offset against a declared total
//!
//! Discovery walks keywords and pages sequentially and merges every hit into
//! a single map keyed by URL, unioning the keywords of repeated hits.

use crate::dates::DateRange;
use crate::fetch::FetchClient;
use crate::models::ArticleMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

pub(crate) mod api;
mod paged;

pub use api::{ApiEnvelope, ApiSearch};
pub use paged::{NextPage, NextPageContext, NextPageFn, PredictiveSearch, ReactiveSearch, ShortPage};

/// Everything a URL builder may use to address one page of search results.
#[derive(Debug, Clone, Copy)]
pub struct SearchQuery<'a> {
    pub keyword: &'a str,
    pub range: &'a DateRange,
    /// Index of the first result on the page.
    pub offset: usize,
    /// Results per page.
    pub limit: usize,
}

impl SearchQuery<'_> {
    /// Zero-based page number.
    pub fn page(&self) -> usize {
        self.offset / self.limit.max(1)
    }

    /// The keyword, percent-encoded for use in a query string or path.
    pub fn encoded_keyword(&self) -> String {
        urlencoding::encode(self.keyword).into_owned()
    }
}

/// Computes the address of a search page.
pub type UrlBuilder = Arc<dyn Fn(&SearchQuery<'_>) -> String + Send + Sync>;

/// Optional bounds on how much work discovery may do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryLimits {
    /// Wall-clock budget for one provider's discovery over all keywords.
    pub deadline: Option<Duration>,
    /// Maximum number of search pages requested per keyword.
    pub max_pages: Option<usize>,
}

impl DiscoveryLimits {
    pub(crate) fn start(&self) -> Budget {
        Budget {
            until: self.deadline.map(|d| Instant::now() + d),
            max_pages: self.max_pages,
        }
    }
}

/// Running state of [`DiscoveryLimits`] for one discovery pass.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    until: Option<Instant>,
    max_pages: Option<usize>,
}

impl Budget {
    /// Whether another page may be requested after `pages` pages of the
    /// current keyword.
    pub(crate) fn allows(&self, pages: usize) -> bool {
        if self.max_pages.is_some_and(|max| pages >= max) {
            return false;
        }
        !self.until.is_some_and(|until| Instant::now() >= until)
    }
}

/// How a provider finds its candidates.
pub enum Discovery {
    Predictive(PredictiveSearch),
    Reactive(ReactiveSearch),
    Api(ApiSearch),
}

impl Discovery {
    fn kind(&self) -> &'static str {
        match self {
            Discovery::Predictive(_) => "predictive",
            Discovery::Reactive(_) => "reactive",
            Discovery::Api(_) => "api",
        }
    }

    /// Runs a search for every keyword and returns all hits keyed by URL.
    ///
    /// Failures never propagate: a page that cannot be fetched or decoded
    /// ends that keyword's search, and the remaining keywords still run.
    #[instrument(level = "info", skip_all, fields(kind = self.kind(), keywords = keywords.len()))]
    pub async fn discover(
        &self,
        client: &FetchClient,
        keywords: &[String],
        range: &DateRange,
        limits: &DiscoveryLimits,
    ) -> ArticleMap {
        let budget = limits.start();
        let mut articles = ArticleMap::new();

        for keyword in keywords {
            let before = articles.len();
            let pages = match self {
                Discovery::Predictive(search) => {
                    search
                        .search(client, keyword, range, &budget, &mut articles)
                        .await
                }
                Discovery::Reactive(search) => {
                    search
                        .search(client, keyword, range, &budget, &mut articles)
                        .await
                }
                Discovery::Api(search) => {
                    search
                        .search(client, keyword, range, &budget, &mut articles)
                        .await
                }
            };
            info!(
                %keyword,
                pages,
                new = articles.len() - before,
                total = articles.len(),
                "Keyword search finished"
            );
        }

        articles
    }
}
