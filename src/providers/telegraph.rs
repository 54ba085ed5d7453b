//! The Telegraph site search.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{Discovery, PredictiveSearch, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules};
use std::sync::Arc;

const SEARCH_URL: &str = "http://www.telegraph.co.uk/template/ver1-0/templates/fragments/otsn/results.jsp\
     ?fq[]=type:Article&sort=recent&paging=true&ajax=true";
const PAGE_SIZE: usize = 20;

fn search_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        format!(
            "{SEARCH_URL}&queryText={}&range={}&rangeTo={}T23:59:59.999Z&p={}&limit={}",
            q.encoded_keyword(),
            q.range.first_day().format("%Y-%m-%d"),
            q.range.last_day().format("%Y-%m-%d"),
            q.page() + 1,
            q.limit,
        )
    })
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle(".twoThirds.gutter .storyhead h2")?
        .body(
            r#".twoThirds.gutter #mainBodyArea div[class$="Par"], .twoThirds.gutter #mainBodyArea div.body"#,
        )?
        .date(DateRule::text(
            ".twoThirds.gutter p.publishedDate",
            DateFormat::pattern("%I:%M%p %z %d %b %Y"),
            DateLocale::English,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    let hits = HitRules::new("ul.searchresults li.searchresult", "div h3 a", "div h3 a")?;
    let search = PredictiveSearch::new(search_url(), hits, PAGE_SIZE);
    Ok(Provider::new(ProviderId::Telegraph, Discovery::Predictive(search)).with_extraction(rules()?))
}
