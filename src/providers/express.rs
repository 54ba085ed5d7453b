//! Daily Express site search.
//!
//! The results page loads further hits through script, which a static fetch
//! cannot follow. The first page however states the total number of matches,
//! and requesting the search again with that number as offset lists every
//! hit on a single page. Discovery therefore fetches at most two pages per
//! keyword, and the date range is enforced after population.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{
    Discovery, NextPage, NextPageContext, NextPageFn, ReactiveSearch, SearchQuery, ShortPage,
    UrlBuilder,
};
use crate::errors::ConfigError;
use crate::extract::{
    DateRule, ExtractionRules, HitRules, absolute_href, select_text, selector,
};
use crate::filters::{MissingDate, date_filter_factory};
use scraper::{ElementRef, Selector};
use std::sync::Arc;
use url::Url;

const SEARCH_URL: &str = "http://www.express.co.uk/search/";
const PAGE_SIZE: usize = 10;

fn first_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        let keyword = q.encoded_keyword();
        format!("{SEARCH_URL}{keyword}?s={keyword}")
    })
}

/// Builds the single-page listing from the match count in the search hint.
fn all_results_url(match_count: Selector, echoed_keyword: Selector) -> NextPageFn {
    Arc::new(move |ctx: &NextPageContext<'_>| {
        if ctx.pages_fetched != 1 {
            return None;
        }
        let count = select_text(ctx.document, &match_count);
        let keyword = select_text(ctx.document, &echoed_keyword);
        if count.is_empty() || keyword.is_empty() {
            return None;
        }
        let keyword = urlencoding::encode(&keyword);
        Some(format!("{SEARCH_URL}{keyword}?s={keyword}&o={count}"))
    })
}

// Result elements are the links themselves.
fn result_link(hit: &ElementRef, base: &Url) -> Option<String> {
    absolute_href(hit, base)
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle("article header h3")?
        .body("article div.ctx_content section:not(.related-articles)")?
        .date(DateRule::attribute(
            "article header div.dates time",
            "datetime",
            DateFormat::Rfc3339,
            DateLocale::English,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    let hits = HitRules::new("section.search-results a.result-item", "a.result-item", "h4.post-title")?
        .with_url_fallback(Arc::new(result_link));
    let next = NextPage::Custom(all_results_url(
        selector("form#search_form p.hint b")?,
        selector("form#search_form p.hint em")?,
    ));
    let search = ReactiveSearch::new(first_url(), hits, PAGE_SIZE, next)
        .on_short_page(ShortPage::Continue.hook());
    Ok(Provider::new(ProviderId::DailyExpress, Discovery::Reactive(search))
        .with_extraction(rules()?)
        .with_post_filter(date_filter_factory(MissingDate::Keep)))
}
