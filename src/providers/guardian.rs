//! The Guardian content API.
//!
//! The search endpoint delivers headline, standfirst, body markup and
//! publication time in one response, so Guardian records never need an
//! article page fetch.

use super::{Provider, ProviderId};
use crate::discovery::{ApiEnvelope, ApiSearch, Discovery, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::html_to_text;
use crate::models::Article;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

const SEARCH_URL: &str = "https://content.guardianapis.com/search";
const PAGE_SIZE: usize = 50;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total: u64,
    #[serde(default)]
    results: Vec<ContentItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentItem {
    web_url: String,
    web_title: String,
    web_publication_date: Option<DateTime<Utc>>,
    #[serde(default)]
    fields: ContentFields,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentFields {
    trail_text: Option<String>,
    body: Option<String>,
}

impl ApiEnvelope for SearchResponse {
    fn total(&self) -> u64 {
        self.total
    }

    fn into_articles(self) -> Vec<Article> {
        self.results
            .into_iter()
            .map(|item| {
                // Cartoons and galleries come without a body.
                let text = item.fields.body.as_deref().map(html_to_text);
                Article::new(item.web_url, item.web_title)
                    .with_subtitle(item.fields.trail_text)
                    .with_published(item.web_publication_date)
                    .with_full_text(text, item.fields.body)
            })
            .collect()
    }
}

fn search_url(api_key: String) -> UrlBuilder {
    let api_key = urlencoding::encode(&api_key).into_owned();
    Arc::new(move |q: &SearchQuery<'_>| {
        format!(
            "{SEARCH_URL}?api-key={api_key}&q={}&from-date={}&to-date={}&page={}&page-size={}\
             &order-by=newest&use-date=published&show-fields=trailText,body",
            q.encoded_keyword(),
            q.range.first_day().format("%Y-%m-%d"),
            q.range.last_day().format("%Y-%m-%d"),
            q.page() + 1,
            q.limit,
        )
    })
}

pub(super) fn provider(api_key: String) -> Result<Provider, ConfigError> {
    let search = ApiSearch::new::<SearchResponse>(search_url(api_key), PAGE_SIZE, Some("response"));
    Ok(Provider::new(ProviderId::Guardian, Discovery::Api(search)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use crate::discovery::api::decode_page;
    use chrono::{NaiveDate, TimeZone};

    const RESPONSE: &str = r#"{
        "response": {
            "status": "ok",
            "total": 2,
            "startIndex": 1,
            "pageSize": 50,
            "results": [
                {
                    "id": "world/2014/jan/05/nsa",
                    "webUrl": "https://www.theguardian.com/world/2014/jan/05/nsa",
                    "webTitle": "NSA files",
                    "webPublicationDate": "2014-01-05T12:00:00Z",
                    "fields": {
                        "trailText": "What the files reveal",
                        "body": "<p>First.</p><p>Second.</p>"
                    }
                },
                {
                    "webUrl": "https://www.theguardian.com/cartoon/2014/jan/06/nsa",
                    "webTitle": "Cartoon",
                    "webPublicationDate": "2014-01-06T08:30:00Z"
                }
            ]
        }
    }"#;

    #[test]
    fn test_decode_search_response() {
        let page = decode_page::<SearchResponse>(RESPONSE.as_bytes(), Some("response")).unwrap();
        assert_eq!(page.total, 2);

        let article = &page.articles[0];
        assert_eq!(article.url(), "https://www.theguardian.com/world/2014/jan/05/nsa");
        assert_eq!(article.subtitle.as_deref(), Some("What the files reveal"));
        assert_eq!(article.full_text.as_deref(), Some("First. Second."));
        assert_eq!(
            article.full_text_html.as_deref(),
            Some("<p>First.</p><p>Second.</p>")
        );
        assert_eq!(
            article.published,
            Some(Utc.with_ymd_and_hms(2014, 1, 5, 12, 0, 0).unwrap())
        );

        let cartoon = &page.articles[1];
        assert_eq!(cartoon.full_text, None);
        assert!(cartoon.published.is_some());
    }

    #[test]
    fn test_search_url() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 1, 31).unwrap(),
        )
        .unwrap();
        let url = search_url("k&y".to_string())(&SearchQuery {
            keyword: "Edward Snowden",
            range: &range,
            offset: 100,
            limit: 50,
        });
        assert!(url.starts_with("https://content.guardianapis.com/search?api-key=k%26y&q=Edward%20Snowden"));
        assert!(url.contains("&from-date=2014-01-01&to-date=2014-01-31&page=3&page-size=50"));
        assert!(url.ends_with("&show-fields=trailText,body"));
    }
}
