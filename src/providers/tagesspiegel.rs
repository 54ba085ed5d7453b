//! Der Tagesspiegel search.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{Discovery, PredictiveSearch, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules};
use chrono::Datelike;
use std::sync::Arc;

const SEARCH_URL: &str = "http://www.tagesspiegel.de/suchergebnis/artikel/";
const PAGE_SIZE: usize = 20;

fn search_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        let from = q.range.first_day();
        let to = q.range.last_day();
        format!(
            "{SEARCH_URL}?sw={}\
             &search-fromday={}&search-frommonth={}&search-fromyear={}\
             &search-today={}&search-tomonth={}&search-toyear={}\
             &p9049616={}",
            q.encoded_keyword(),
            from.day(),
            from.month(),
            from.year(),
            to.day(),
            to.month(),
            to.year(),
            q.page() + 1,
        )
    })
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle("article p.hcf-teaser")?
        .body("article > p:not(.hcf-teaser)")?
        .date(DateRule::text(
            "article span.date",
            DateFormat::pattern("%d.%m.%Y %H:%M Uhr"),
            DateLocale::German,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    // Teasers without a headline link are skipped by the hit extraction.
    let hits = HitRules::new(
        "div.hcf-result > ul.hcf-teaser-list > li.hcf-teaser:not(.hcf-hidden)",
        "h2 a",
        "h2 a span.hcf-headline",
    )?;
    let search = PredictiveSearch::new(search_url(), hits, PAGE_SIZE);
    Ok(Provider::new(ProviderId::Tagesspiegel, Discovery::Predictive(search))
        .with_extraction(rules()?))
}
