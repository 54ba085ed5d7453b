//! Offset-paged JSON search APIs.

use super::{Budget, SearchQuery, UrlBuilder};
use crate::dates::DateRange;
use crate::fetch::FetchClient;
use crate::models::{Article, ArticleMap, merge_article};
use crate::utils::truncate_for_log;
use serde::de::{DeserializeOwned, Error as _};
use tracing::{debug, warn};

/// A typed response page of a search API.
pub trait ApiEnvelope: DeserializeOwned {
    /// Number of results the API claims to have for the whole query.
    fn total(&self) -> u64;

    /// The items of this page as candidate records. Fields the API already
    /// delivers are set; the populator leaves them alone.
    fn into_articles(self) -> Vec<Article>;
}

/// One decoded API page.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiPage {
    pub total: u64,
    pub articles: Vec<Article>,
}

/// Decodes a response page, first unwrapping the field named `root` when
/// the API nests its payload.
pub fn decode_page<E: ApiEnvelope>(
    bytes: &[u8],
    root: Option<&str>,
) -> Result<ApiPage, serde_json::Error> {
    let envelope: E = match root {
        None => serde_json::from_slice(bytes)?,
        Some(root) => {
            let mut value: serde_json::Value = serde_json::from_slice(bytes)?;
            let inner = value
                .get_mut(root)
                .map(serde_json::Value::take)
                .ok_or_else(|| serde_json::Error::custom(format!("missing root field `{root}`")))?;
            serde_json::from_value(inner)?
        }
    };
    Ok(ApiPage {
        total: envelope.total(),
        articles: envelope.into_articles(),
    })
}

type DecodeFn = fn(&[u8], Option<&str>) -> Result<ApiPage, serde_json::Error>;

/// Search against a JSON API that pages by offset.
pub struct ApiSearch {
    pub url: UrlBuilder,
    pub page_size: usize,
    pub root: Option<String>,
    decode: DecodeFn,
}

impl ApiSearch {
    /// A search whose pages decode into `E`.
    pub fn new<E: ApiEnvelope>(url: UrlBuilder, page_size: usize, root: Option<&str>) -> Self {
        Self {
            url,
            page_size,
            root: root.map(str::to_string),
            decode: decode_page::<E>,
        }
    }

    /// Pages through the results for one keyword. Returns the number of
    /// pages fetched.
    pub(crate) async fn search(
        &self,
        client: &FetchClient,
        keyword: &str,
        range: &DateRange,
        budget: &Budget,
        articles: &mut ArticleMap,
    ) -> usize {
        let mut offset = 0;
        let mut pages = 0;

        while budget.allows(pages) {
            let url = (self.url)(&SearchQuery {
                keyword,
                range,
                offset,
                limit: self.page_size,
            });
            let bytes = match client.get_bytes(&url).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(%keyword, %url, error = %e, "API page fetch failed; ending keyword search");
                    break;
                }
            };
            pages += 1;

            let page = match (self.decode)(&bytes, self.root.as_deref()) {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        %keyword,
                        %url,
                        error = %e,
                        body_preview = %truncate_for_log(&String::from_utf8_lossy(&bytes), 300),
                        "API page did not decode; ending keyword search"
                    );
                    break;
                }
            };

            let count = page.articles.len();
            debug!(%keyword, offset, count, total = page.total, "Read API page");
            for article in page.articles {
                merge_article(articles, article.with_keyword(keyword));
            }

            let total = usize::try_from(page.total).unwrap_or(usize::MAX);
            if count == 0 || offset + self.page_size >= total {
                break;
            }
            offset += self.page_size;
        }

        pages
    }
}
