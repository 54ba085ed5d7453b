//! Runs the acquisition pipeline for every selected provider.
//!
//! Each provider goes through discovery, the pre-population filter,
//! population and the post-population filter on its own tokio task, inside a
//! `provider` tracing span. Providers share nothing mutable; a provider whose
//! task fails contributes an empty result and the others are unaffected.

use crate::config::Config;
use crate::dates::DateRange;
use crate::discovery::DiscoveryLimits;
use crate::errors::ConfigError;
use crate::fetch::FetchClient;
use crate::filters::{PreFilter, all_pre, apply_post_filter, apply_pre_filter};
use crate::models::{ArticleMap, RunResult};
use crate::populate::Populator;
use crate::providers::{Provider, ProviderId};
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span, instrument};

/// One provider with the client and filters it runs with.
struct Lane {
    provider: Provider,
    client: FetchClient,
    pre_filter: Option<PreFilter>,
}

impl Lane {
    async fn acquire(
        &self,
        keywords: &[String],
        range: &DateRange,
        limits: &DiscoveryLimits,
        workers: usize,
    ) -> ArticleMap {
        let provider = &self.provider;

        let discovered = provider
            .discovery
            .discover(&self.client, keywords, range, limits)
            .await;
        let candidates = apply_pre_filter(discovered, self.pre_filter.as_ref());
        info!(candidates = candidates.len(), "Candidates to populate");

        let populated = Populator::new(self.client.clone(), workers, provider.extraction.clone())
            .with_delay(provider.delay.clone())
            .populate(candidates)
            .await;

        let post_filter = provider.post_filter.as_ref().map(|factory| factory(range));
        let articles = apply_post_filter(populated, post_filter.as_ref());
        info!(articles = articles.len(), "Provider finished");
        articles
    }
}

/// Drives all providers of a run.
pub struct Orchestrator {
    config: Config,
    lanes: Vec<Arc<Lane>>,
}

impl Orchestrator {
    /// Prepares `providers` for running under `config`.
    ///
    /// # Errors
    ///
    /// Fails when the HTTP client cannot be built, a provider's user agent is
    /// not a valid header value, or a configured URL exclusion pattern does
    /// not compile.
    pub fn new(config: Config, providers: Vec<Provider>) -> Result<Self, ConfigError> {
        let client = FetchClient::new(config.timeout(), &config.user_agent)?;
        let exclusions = config.exclude.pre_filter()?;

        let lanes = providers
            .into_iter()
            .map(|provider| -> Result<Arc<Lane>, ConfigError> {
                let client = match &provider.user_agent {
                    Some(user_agent) => client.with_user_agent(user_agent)?,
                    None => client.clone(),
                };
                let pre_filter = match (provider.pre_filter.clone(), exclusions.clone()) {
                    (Some(own), Some(shared)) => Some(all_pre(vec![own, shared])),
                    (own, shared) => own.or(shared),
                };
                Ok(Arc::new(Lane {
                    provider,
                    client,
                    pre_filter,
                }))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { config, lanes })
    }

    pub fn provider_ids(&self) -> Vec<ProviderId> {
        self.lanes.iter().map(|lane| lane.provider.id).collect()
    }

    /// Collects the articles matching `keywords` within `range` from every
    /// provider.
    ///
    /// Always completes; the result holds an entry for every provider, empty
    /// when that provider found nothing or failed.
    #[instrument(level = "info", skip_all, fields(providers = self.lanes.len(), keywords = keywords.len()))]
    pub async fn run(&self, keywords: &[String], range: &DateRange) -> RunResult {
        let keywords: Arc<[String]> = keywords.into();
        let limits = self.config.limits();
        let workers = self.config.workers;

        let handles: Vec<_> = self
            .lanes
            .iter()
            .map(|lane| {
                let lane = Arc::clone(lane);
                let keywords = Arc::clone(&keywords);
                let range = *range;
                let span = info_span!("provider", provider = %lane.provider.id);
                let id = lane.provider.id;
                let handle = tokio::spawn(
                    async move { lane.acquire(&keywords, &range, &limits, workers).await }
                        .instrument(span),
                );
                (id, handle)
            })
            .collect();

        let mut result = RunResult::new();
        for (id, handle) in handles {
            let articles = match handle.await {
                Ok(articles) => articles,
                Err(e) => {
                    error!(provider = %id, error = %e, "Provider task failed; continuing without its articles");
                    ArticleMap::new()
                }
            };
            result.insert(id, articles);
        }

        info!(
            articles = result.values().map(|articles| articles.len()).sum::<usize>(),
            "Run finished"
        );
        result
    }
}
