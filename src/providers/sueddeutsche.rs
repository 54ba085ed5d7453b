//! Süddeutsche Zeitung search.
//!
//! The search has no date parameters; results come newest first and the range
//! is enforced after population.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{Discovery, PredictiveSearch, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules};
use crate::filters::{MissingDate, date_filter_factory};
use std::sync::Arc;

const SEARCH_URL: &str = "http://suche.sueddeutsche.de/query/";
const PAGE_SIZE: usize = 15;

fn search_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        format!(
            "{SEARCH_URL}{}/nav/§documenttype:Artikel/sort/-docdatetime/page/{}",
            q.encoded_keyword(),
            q.page() + 1,
        )
    })
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle("article section.body p.article.entry-summary")?
        .body("article section.body p:not([class]), article section.body ul, article section.body h3")?
        .date(DateRule::attribute(
            "article section.header time",
            "datetime",
            DateFormat::pattern("%Y-%m-%d %H:%M:%S"),
            DateLocale::German,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    // Result links nest an overline and a teaser below the headline text.
    let hits = HitRules::new(
        "div#sitecontent.search div.content div.teaser",
        "a.entry-title",
        "a.entry-title",
    )?
    .with_own_title_text();
    let search = PredictiveSearch::new(search_url(), hits, PAGE_SIZE);
    Ok(Provider::new(ProviderId::Sueddeutsche, Discovery::Predictive(search))
        .with_extraction(rules()?)
        .with_post_filter(date_filter_factory(MissingDate::Keep)))
}
