//! Die Zeit content API.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale, parse_date};
use crate::discovery::{ApiEnvelope, ApiSearch, Discovery, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::ExtractionRules;
use crate::models::Article;
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

const SEARCH_URL: &str = "http://api.zeit.de/content";
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    found: u64,
    #[serde(default)]
    matches: Vec<Match>,
}

#[derive(Debug, Deserialize)]
struct Match {
    href: String,
    title: String,
    subtitle: Option<String>,
    release_date: Option<String>,
}

impl ApiEnvelope for SearchResponse {
    fn total(&self) -> u64 {
        self.found
    }

    fn into_articles(self) -> Vec<Article> {
        self.matches
            .into_iter()
            .map(|m| {
                let published = m.release_date.as_deref().and_then(|raw| {
                    parse_date(raw, &DateFormat::Rfc3339, DateLocale::German)
                        .map_err(|e| warn!(url = %m.href, error = %e, "Unparseable release date"))
                        .ok()
                });
                Article::new(m.href, m.title)
                    .with_subtitle(m.subtitle)
                    .with_published(published)
            })
            .collect()
    }
}

fn search_url(api_key: String) -> UrlBuilder {
    let api_key = urlencoding::encode(&api_key).into_owned();
    Arc::new(move |q: &SearchQuery<'_>| {
        let query = format!(
            "{} AND release_date:[{}T00:00:00Z TO {}T23:59:59Z]",
            q.keyword,
            q.range.first_day().format("%Y-%m-%d"),
            q.range.last_day().format("%Y-%m-%d"),
        );
        format!(
            "{SEARCH_URL}?api_key={api_key}&q={}&offset={}&limit={}\
             &sort=release_date%20desc&fields=href,title,subtitle,release_date",
            urlencoding::encode(&query),
            q.offset,
            q.limit,
        )
    })
}

pub(super) fn provider(api_key: String) -> Result<Provider, ConfigError> {
    let search = ApiSearch::new::<SearchResponse>(search_url(api_key), PAGE_SIZE, None);
    let rules = ExtractionRules::new().body(".article-body")?;
    Ok(Provider::new(ProviderId::Zeit, Discovery::Api(search)).with_extraction(rules))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use crate::discovery::api::decode_page;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_decode_matches() {
        let body = r#"{
            "found": 2,
            "limit": 100,
            "offset": 0,
            "matches": [
                {
                    "href": "http://www.zeit.de/digital/2014-01/nsa",
                    "title": "Überwachung",
                    "subtitle": "Die NSA hört mit",
                    "release_date": "2014-01-05T11:00:00Z"
                },
                {
                    "href": "http://www.zeit.de/politik/2014-01/snowden",
                    "title": "Snowden",
                    "release_date": "last tuesday"
                }
            ]
        }"#;
        let page = decode_page::<SearchResponse>(body.as_bytes(), None).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.articles[0].subtitle.as_deref(), Some("Die NSA hört mit"));
        assert_eq!(
            page.articles[0].published,
            Some(Utc.with_ymd_and_hms(2014, 1, 5, 11, 0, 0).unwrap())
        );
        assert_eq!(page.articles[1].published, None);
    }

    #[test]
    fn test_search_url_embeds_date_range_in_query() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 1, 31).unwrap(),
        )
        .unwrap();
        let url = search_url("key".to_string())(&SearchQuery {
            keyword: "NSA",
            range: &range,
            offset: 200,
            limit: 100,
        });
        assert!(url.starts_with("http://api.zeit.de/content?api_key=key&q=NSA%20AND%20release_date%3A%5B2014-01-01T00%3A00%3A00Z%20TO%202014-01-31T23%3A59%3A59Z%5D"));
        assert!(url.contains("&offset=200&limit=100"));
    }

    #[test]
    fn test_body_rule() {
        let provider = provider("key".to_string()).unwrap();
        let fields = provider
            .extraction
            .unwrap()
            .extract(r#"<div class="article-body"><p>Erster Absatz.</p></div>"#);
        assert_eq!(fields.full_text.as_deref(), Some("Erster Absatz."));
    }
}
