//! Daily Mail site search.
//!
//! The search form cannot restrict by date, so the date range is enforced
//! after population. The site throttles aggressive clients, so article pages
//! are fetched with a random pause.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{Discovery, PredictiveSearch, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules};
use crate::filters::{MissingDate, date_filter_factory};
use crate::populate::jittered_delay;
use std::sync::Arc;
use std::time::Duration;

const SEARCH_URL: &str = "http://www.dailymail.co.uk/home/search.html?sel=site&type=article";
const PAGE_SIZE: usize = 50;
const MAX_DELAY: Duration = Duration::from_secs(4);

fn search_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        format!(
            "{SEARCH_URL}&searchPhrase={}&size={}&offset={}&sort=recent&days=all",
            q.encoded_keyword(),
            q.limit,
            q.offset,
        )
    })
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle("div.article-text > h1 + ul.mol-bullets-with-font")?
        .body(concat!(
            r#"div.article-text h1 ~ p:not(.author-section):not([class*="byline"]), "#,
            "div.article-text h1 ~ div:not(.column-content.cleared):not(#most-read-news-wrapper)",
            ":not(#most-watched-videos-wrapper):not(.article-reader-comments)",
            ":not(#articleIconLinksContainer):not(#taboola-below-main-column)",
        ))?
        .date(DateRule::text(
            "div.article-text span.article-timestamp",
            DateFormat::pattern("%H:%M %z, %d %B %Y"),
            DateLocale::English,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    let hits = HitRules::new(
        "div#search div.sch-results div.sch-result",
        "div.sch-res-content h3.sch-res-title a",
        "div.sch-res-content h3.sch-res-title a",
    )?;
    let search = PredictiveSearch::new(search_url(), hits, PAGE_SIZE);
    Ok(Provider::new(ProviderId::DailyMail, Discovery::Predictive(search))
        .with_extraction(rules()?)
        .with_post_filter(date_filter_factory(MissingDate::Keep))
        .with_delay(jittered_delay(MAX_DELAY)))
}
