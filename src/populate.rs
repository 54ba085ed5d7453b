//! Concurrent article population.
//!
//! Every candidate that survived the pre-filter is handed to its own tokio
//! task. At most `workers` tasks run at once; a failing or panicking task only
//! loses its own candidate's content.

use crate::extract::ExtractionRules;
use crate::fetch::FetchClient;
use crate::models::{Article, ArticleMap, fill};
use futures::stream::{self, StreamExt};
use rand::{Rng, rng};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Decides how long to wait before fetching the article at the given URL.
pub type DelayHook = Arc<dyn Fn(&str) -> Option<Duration> + Send + Sync>;

/// A delay drawn uniformly from `0..=max` before every fetch.
pub fn jittered_delay(max: Duration) -> DelayHook {
    let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
    Arc::new(move |_: &str| Some(Duration::from_millis(rng().random_range(0..=max_ms))))
}

/// Fills in the content of discovered candidates.
#[derive(Clone)]
pub struct Populator {
    client: FetchClient,
    workers: usize,
    rules: Option<Arc<ExtractionRules>>,
    delay: Option<DelayHook>,
}

impl Populator {
    /// A populator running at most `workers` fetches at once. Without
    /// `rules` candidates are taken as they are.
    pub fn new(client: FetchClient, workers: usize, rules: Option<Arc<ExtractionRules>>) -> Self {
        Self {
            client,
            workers: workers.max(1),
            rules,
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Option<DelayHook>) -> Self {
        self.delay = delay;
        self
    }

    /// Populates every candidate of `articles` and returns them in a new map.
    ///
    /// Returns only after every candidate has been processed.
    #[instrument(level = "info", skip_all, fields(candidates = articles.len(), workers = self.workers))]
    pub async fn populate(&self, articles: ArticleMap) -> ArticleMap {
        let populated: ArticleMap = stream::iter(articles.into_values())
            .map(|article| {
                let this = self.clone();
                let snapshot = article.clone();
                async move {
                    match tokio::spawn(async move { this.populate_one(article).await }).await {
                        Ok(article) => article,
                        Err(e) => {
                            error!(url = %snapshot.url(), error = %e, "Population task failed");
                            snapshot
                        }
                    }
                }
            })
            .buffer_unordered(self.workers)
            .map(|article| (article.url().to_string(), article))
            .collect()
            .await;

        let succeeded = populated.values().filter(|a| a.is_populated()).count();
        info!(
            total = populated.len(),
            succeeded,
            failed = populated.len() - succeeded,
            "Population finished"
        );
        populated
    }

    async fn populate_one(&self, mut article: Article) -> Article {
        let rules = match &self.rules {
            Some(rules) if !article.is_complete() => Arc::clone(rules),
            _ => {
                article.mark_populated();
                return article;
            }
        };

        if let Some(delay) = self.delay.as_ref().and_then(|hook| hook(article.url())) {
            tokio::time::sleep(delay).await;
        }

        let body = match self.client.get_text(article.url()).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %article.url(), error = %e, "Article fetch failed");
                return article;
            }
        };

        let fields = rules.extract(&body);
        if let Some(subtitle) = fields.subtitle {
            fill(&mut article.subtitle, subtitle);
        }
        if let Some(text) = fields.full_text {
            fill(&mut article.full_text, text);
        }
        if let Some(html) = fields.full_text_html {
            fill(&mut article.full_text_html, html);
        }
        if article.published.is_none() {
            match fields.published {
                Ok(published) => article.published = published,
                Err(e) => warn!(url = %article.url(), error = %e, "Unparseable publication date"),
            }
        }

        debug!(
            url = %article.url(),
            keywords = ?article.keywords(),
            complete = article.is_complete(),
            "Populated article"
        );
        article.mark_populated();
        article
    }
}
