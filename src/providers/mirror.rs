//! Mirror advanced search.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{Discovery, PredictiveSearch, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules};
use crate::filters::reject_url_suffixes;
use std::sync::Arc;

const SEARCH_URL: &str =
    "http://www.mirror.co.uk/search/advanced.do?destinationSectionId=219&publicationName=mirror";
const PAGE_SIZE: usize = 50;

fn search_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        let date_range = format!(
            "{}T00:00:00Z TO {}T23:59:59Z",
            q.range.first_day().format("%Y-%m-%d"),
            q.range.last_day().format("%Y-%m-%d"),
        );
        format!(
            "{SEARCH_URL}&searchString={}&dateRange={}&pageLength={}&pageNumber={}\
             &sortString=publishdate&sortOrder=desc",
            q.encoded_keyword(),
            urlencoding::encode(&date_range),
            q.limit,
            q.page() + 1,
        )
    })
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle(r#"div.article-page div.article div[itemprop*="alternativeHeadline"]"#)?
        .body(r#"div.article-page div.article div[itemprop="articleBody"]"#)?
        .date(DateRule::attribute(
            r#"time[itemprop="datePublished"][datetime]"#,
            "datetime",
            DateFormat::pattern("%Y-%m-%dT%H:%M%z"),
            DateLocale::English,
        )?)
        .date(DateRule::text(
            r#"div.article-page div.article [data-type="pub-date"]"#,
            DateFormat::pattern("%H:%M, %d %b %Y"),
            DateLocale::English,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    let hits = HitRules::new("div.search-results div.article:not(.no-results)", "h3 a", "h3 a")?;
    let search = PredictiveSearch::new(search_url(), hits, PAGE_SIZE);
    Ok(Provider::new(ProviderId::Mirror, Discovery::Predictive(search))
        .with_extraction(rules()?)
        // Picture galleries and live blogs
        .with_pre_filter(reject_url_suffixes([".ece"])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_search_url_encodes_date_range() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 1, 31).unwrap(),
        )
        .unwrap();
        let url = search_url()(&SearchQuery {
            keyword: "NSA",
            range: &range,
            offset: 0,
            limit: 50,
        });
        assert!(url.contains(
            "&searchString=NSA&dateRange=2014-01-01T00%3A00%3A00Z%20TO%202014-01-31T23%3A59%3A59Z&pageLength=50&pageNumber=1"
        ));
    }

    #[test]
    fn test_gallery_urls_are_rejected() {
        let provider = provider().unwrap();
        let filter = provider.pre_filter.unwrap();
        assert!(!filter("http://www.mirror.co.uk/news/gallery/nsa-pictures-123.ece"));
        assert!(filter("http://www.mirror.co.uk/news/world-news/nsa-row-123"));
    }

    #[test]
    fn test_date_falls_back_to_visible_stamp() {
        let page = r#"
            <div class="article-page"><div class="article">
              <div itemprop="alternativeHeadline">Spy agency</div>
              <p data-type="pub-date">14:05, 09 Jan 2014</p>
              <div itemprop="articleBody"><p>Text.</p></div>
            </div></div>
        "#;
        let fields = rules().unwrap().extract(page);
        assert_eq!(fields.subtitle.as_deref(), Some("Spy agency"));
        assert_eq!(fields.full_text.as_deref(), Some("Text."));
        assert_eq!(
            fields.published,
            Ok(Some(Utc.with_ymd_and_hms(2014, 1, 9, 14, 5, 0).unwrap()))
        );
    }
}
