//! Welt Online search.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{
    Discovery, NextPage, NextPageContext, NextPageFn, ReactiveSearch, SearchQuery, ShortPage,
    UrlBuilder,
};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules, absolute_href, selector};
use scraper::Selector;
use std::sync::Arc;

const SEARCH_URL: &str =
    "http://suchen.welt.de/woa/search.do?outputs=80&wtmc=suche_main&mode=extended";
const PAGE_SIZE: usize = 10;

fn first_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        format!(
            "{SEARCH_URL}&search={}&date=period&dateFrom={}&dateTo={}&order=date%20desc&length={}",
            q.encoded_keyword(),
            q.range.first_day().format("%d.%m.%Y"),
            q.range.last_day().format("%d.%m.%Y"),
            q.limit,
        )
    })
}

/// The pagination links drop the result count, which would shrink every
/// following page back to the default size.
fn next_url(link: Selector) -> NextPageFn {
    Arc::new(move |ctx: &NextPageContext<'_>| {
        let element = ctx.document.select(&link).next()?;
        absolute_href(&element, ctx.current_url).map(|href| format!("{href}&outputs=80"))
    })
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle("div#main p#artAbstract")?
        .body("div#main div.groupWrapper div.storyBody")?
        .date(DateRule::text(
            "div.timestamp span.time",
            DateFormat::pattern("%d.%m.%y"),
            DateLocale::German,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    let hits = HitRules::new("div.SearchrResultList div.article", "h4.headLine a", "h4.headLine a")?;
    let next = NextPage::Custom(next_url(selector("div.pagination span.page.next a")?));
    let search = ReactiveSearch::new(first_url(), hits, PAGE_SIZE, next)
        .on_short_page(ShortPage::Continue.hook());
    Ok(Provider::new(ProviderId::Welt, Discovery::Reactive(search)).with_extraction(rules()?))
}
