//! Stern archive search.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{Discovery, PredictiveSearch, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules};
use chrono::Datelike;
use std::sync::Arc;

const SEARCH_URL: &str = "http://wefind.stern.de/suche?extendedSearch=on";
const PAGE_SIZE: usize = 10;

fn search_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        let from = q.range.first_day();
        let to = q.range.last_day();
        format!(
            "{SEARCH_URL}&query={}&datehistogram=range\
             &rangeFromDay={}&rangeFromMonth={}&rangeFromYear={}\
             &rangeToDay={}&rangeToMonth={}&rangeToYear={}\
             &format=Artikel&pageIndex={}",
            q.encoded_keyword(),
            from.day(),
            from.month(),
            from.year(),
            to.day(),
            to.month(),
            to.year(),
            q.page(),
        )
    })
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle("p#div_article_intro")?
        .body(concat!(
            r#"div#main.pageArticle div[itemprop="mainContentOfPage"] span[itemprop="articleBody"], "#,
            "div#main.pageArticle div.boxTabProContra ~ div.boxContent, ",
            "div#main.pageArticle div#div_module_xl7 div.moduleHookContainer:nth-child(1) ~ *",
        ))?
        .date(DateRule::text(
            "div#main.pageArticle div.datePublished",
            DateFormat::pattern("%d. %B %Y, %H:%M"),
            DateLocale::German,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    let hits = HitRules::new(
        "div#main div#boxArchiveContent1 div.moduleL17",
        "a.h2",
        "a.h2 span.boxHeadline",
    )?;
    let search = PredictiveSearch::new(search_url(), hits, PAGE_SIZE);
    Ok(Provider::new(ProviderId::Stern, Discovery::Predictive(search)).with_extraction(rules()?))
}
