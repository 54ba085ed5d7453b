//! Der Spiegel and Spiegel Online.
//!
//! Both share one search form, distinguished by the source group, and one
//! results layout. Article pages differ: print articles live in the archive
//! with a short date stamp, online articles carry one of several structured
//! or visible timestamps depending on their age.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{Discovery, PredictiveSearch, SearchQuery, ShortPage, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules};
use std::sync::Arc;

const SEARCH_URL: &str = "http://www.spiegel.de/suche/index.html";
const PAGE_SIZE: usize = 20;

const PRINT_SOURCES: &str = "SP";
const ONLINE_SOURCES: &str = "SPOX";

fn search_url(sources: &'static str) -> UrlBuilder {
    Arc::new(move |q: &SearchQuery<'_>| {
        format!(
            "{SEARCH_URL}?quellenGroup={sources}&suchbegriff={}&fromDate={}&toDate={}\
             &pageNumber={}&offsets={}",
            q.encoded_keyword(),
            q.range.first_day().format("%d.%m.%Y"),
            q.range.last_day().format("%d.%m.%Y"),
            q.page() + 1,
            q.offset,
        )
    })
}

fn hits() -> Result<HitRules, ConfigError> {
    HitRules::new(
        "#content-main .column-wide.spSearchPage .search-teaser",
        "a",
        ".headline",
    )
}

fn print_rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle("#content-main p.author ~ p > strong")?
        .body("#content-main div.artikel")?
        .date(DateRule::text(
            "div#spShortDate",
            DateFormat::pattern("%d.%m.%Y"),
            DateLocale::German,
        )?))
}

fn online_rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle("#content-main p.article-intro")?
        .body("#content-main .article-section")?
        .date(DateRule::attribute(
            r#"time[itemprop="datePublished"][datetime]"#,
            "datetime",
            DateFormat::pattern("%Y-%m-%d %H:%M:%S"),
            DateLocale::German,
        )?)
        .date(DateRule::attribute(
            r#"span[itemprop="datePublished"][content]"#,
            "content",
            DateFormat::pattern("%Y-%m-%dT%H:%M:%S%z"),
            DateLocale::German,
        )?)
        .date(DateRule::text(
            ".module-box .article-function-box-wide span",
            DateFormat::pattern("%d.%m.%Y – %H:%M Uhr"),
            DateLocale::German,
        )?)
        .date(DateRule::text(
            "#content-main li.article-function-date time",
            DateFormat::pattern("%A, %d.%m.%Y – %H:%M Uhr"),
            DateLocale::German,
        )?))
}

/// The print magazine. Its search regularly returns fewer hits than the page
/// size on pages that are not the last one, so short pages do not end a
/// keyword.
pub(super) fn print_provider() -> Result<Provider, ConfigError> {
    let search = PredictiveSearch::new(search_url(PRINT_SOURCES), hits()?, PAGE_SIZE)
        .on_short_page(ShortPage::Continue.hook());
    Ok(Provider::new(ProviderId::Spiegel, Discovery::Predictive(search))
        .with_extraction(print_rules()?))
}

pub(super) fn online_provider() -> Result<Provider, ConfigError> {
    let search = PredictiveSearch::new(search_url(ONLINE_SOURCES), hits()?, PAGE_SIZE);
    Ok(Provider::new(ProviderId::SpiegelOnline, Discovery::Predictive(search))
        .with_extraction(online_rules()?))
}
