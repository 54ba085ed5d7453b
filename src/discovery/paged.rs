//! Paginated HTML search.

use super::{Budget, SearchQuery, UrlBuilder};
use crate::dates::DateRange;
use crate::errors::ConfigError;
use crate::extract::{Hit, HitPage, HitRules, absolute_href, hits_in, selector};
use crate::fetch::FetchClient;
use crate::models::{Article, ArticleMap, merge_article};
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Decision taken when a page holds fewer results than the page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortPage {
    Stop,
    Continue,
}

/// A results page that came back shorter than expected.
#[derive(Debug, Clone)]
pub struct ShortPageEvent {
    pub keyword: String,
    pub page_url: String,
    pub found: usize,
    pub expected: usize,
}

pub type ShortPageHook = Arc<dyn Fn(&ShortPageEvent) -> ShortPage + Send + Sync>;

impl ShortPage {
    /// A hook that logs the event and always answers `self`.
    pub fn hook(self) -> ShortPageHook {
        Arc::new(move |event: &ShortPageEvent| {
            info!(
                keyword = %event.keyword,
                url = %event.page_url,
                found = event.found,
                expected = event.expected,
                decision = ?self,
                "Fewer results than expected"
            );
            self
        })
    }
}

/// What the next-page function gets to look at.
pub struct NextPageContext<'a> {
    pub document: &'a Html,
    pub current_url: &'a Url,
    /// Pages fetched for this keyword so far, including the current one.
    pub pages_fetched: usize,
}

pub type NextPageFn = Arc<dyn Fn(&NextPageContext<'_>) -> Option<String> + Send + Sync>;

/// How a reactive search finds the address of the following page.
#[derive(Clone)]
pub enum NextPage {
    /// The `href` of the first element matching the selector.
    Link(Selector),
    Custom(NextPageFn),
}

impl NextPage {
    pub fn link(css: &str) -> Result<Self, ConfigError> {
        Ok(NextPage::Link(selector(css)?))
    }

    fn resolve(&self, context: &NextPageContext<'_>) -> Option<String> {
        match self {
            NextPage::Link(sel) => context
                .document
                .select(sel)
                .next()
                .and_then(|link| absolute_href(&link, context.current_url)),
            NextPage::Custom(next) => next(context),
        }
    }
}

/// Search whose page addresses follow from keyword, date range and offset.
pub struct PredictiveSearch {
    pub url: UrlBuilder,
    pub hits: HitRules,
    pub page_size: usize,
    pub short_page: ShortPageHook,
}

impl PredictiveSearch {
    pub fn new(url: UrlBuilder, hits: HitRules, page_size: usize) -> Self {
        Self {
            url,
            hits,
            page_size,
            short_page: ShortPage::Stop.hook(),
        }
    }

    pub fn on_short_page(mut self, hook: ShortPageHook) -> Self {
        self.short_page = hook;
        self
    }

    /// Searches one keyword page by page. Returns the number of pages fetched.
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
            let Some((page_url, body)) = fetch_page(client, keyword, &url).await else {
                break;
            };
            pages += 1;

            let page = {
                let document = Html::parse_document(&body);
                hits_in(&document, &page_url, &self.hits)
            };
            if !record_page(keyword, &url, page, self.page_size, &self.short_page, articles) {
                break;
            }
            offset += self.page_size;
        }

        pages
    }
}

/// Search whose next page address is read from the current page.
pub struct ReactiveSearch {
    pub first_url: UrlBuilder,
    pub hits: HitRules,
    pub page_size: usize,
    pub next: NextPage,
    pub short_page: ShortPageHook,
}

impl ReactiveSearch {
    pub fn new(first_url: UrlBuilder, hits: HitRules, page_size: usize, next: NextPage) -> Self {
        Self {
            first_url,
            hits,
            page_size,
            next,
            short_page: ShortPage::Stop.hook(),
        }
    }

    pub fn on_short_page(mut self, hook: ShortPageHook) -> Self {
        self.short_page = hook;
        self
    }

    /// Follows next-page links for one keyword. Returns the number of pages
    /// fetched.
    pub(crate) async fn search(
        &self,
        client: &FetchClient,
        keyword: &str,
        range: &DateRange,
        budget: &Budget,
        articles: &mut ArticleMap,
    ) -> usize {
        let mut url = (self.first_url)(&SearchQuery {
            keyword,
            range,
            offset: 0,
            limit: self.page_size,
        });
        let mut pages = 0;

        while budget.allows(pages) {
            let Some((page_url, body)) = fetch_page(client, keyword, &url).await else {
                break;
            };
            pages += 1;

            let (page, next) = self.read_page(&body, &page_url, pages);
            if !record_page(keyword, &url, page, self.page_size, &self.short_page, articles) {
                break;
            }
            match next {
                Some(next) if next != url && next != page_url.as_str() => url = next,
                Some(_) => {
                    debug!(%keyword, %url, "Next page points back to current page");
                    break;
                }
                None => {
                    debug!(%keyword, %url, "No next page");
                    break;
                }
            }
        }

        pages
    }

    fn read_page(&self, body: &str, page_url: &Url, pages_fetched: usize) -> (HitPage, Option<String>) {
        let document = Html::parse_document(body);
        let page = hits_in(&document, page_url, &self.hits);
        let next = self.next.resolve(&NextPageContext {
            document: &document,
            current_url: page_url,
            pages_fetched,
        });
        (page, next)
    }
}

async fn fetch_page(client: &FetchClient, keyword: &str, url: &str) -> Option<(Url, String)> {
    let body = match client.get_text(url).await {
        Ok(body) => body,
        Err(e) => {
            warn!(%keyword, %url, error = %e, "Search page fetch failed; ending keyword search");
            return None;
        }
    };
    match Url::parse(url) {
        Ok(page_url) => Some((page_url, body)),
        Err(e) => {
            warn!(%keyword, %url, error = %e, "Unusable search page address");
            None
        }
    }
}

/// Merges the hits of one page. Returns `false` when the search for this
/// keyword is exhausted.
fn record_page(
    keyword: &str,
    url: &str,
    page: HitPage,
    page_size: usize,
    short_page: &ShortPageHook,
    articles: &mut ArticleMap,
) -> bool {
    if page.matched == 0 {
        debug!(%keyword, %url, "Empty results page");
        return false;
    }

    debug!(%keyword, %url, matched = page.matched, hits = page.hits.len(), "Read results page");
    for Hit {
        url: hit_url,
        title,
    } in page.hits
    {
        merge_article(articles, Article::new(hit_url, title).with_keyword(keyword));
    }

    if page.matched < page_size {
        let event = ShortPageEvent {
            keyword: keyword.to_string(),
            page_url: url.to_string(),
            found: page.matched,
            expected: page_size,
        };
        return short_page(&event) == ShortPage::Continue;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::{Discovery, DiscoveryLimits};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 1, 31).unwrap(),
        )
        .unwrap()
    }

    fn client() -> FetchClient {
        FetchClient::new(Duration::from_secs(5), "news_scraper-test").unwrap()
    }

    fn rules() -> HitRules {
        HitRules::new("ul.results li", "a", "a").unwrap()
    }

    fn results_page(hits: &[(&str, &str)]) -> String {
        let items: String = hits
            .iter()
            .map(|(url, title)| format!(r#"<li><a href="{url}">{title}</a></li>"#))
            .collect();
        format!(r#"<html><body><ul class="results">{items}</ul></body></html>"#)
    }

    fn offset_search(server: &MockServer, page_size: usize) -> PredictiveSearch {
        let base = server.uri();
        PredictiveSearch::new(
            Arc::new(move |q: &SearchQuery<'_>| {
                format!(
                    "{base}/search?q={}&from={}&offset={}",
                    q.encoded_keyword(),
                    q.range.first_day(),
                    q.offset
                )
            }),
            rules(),
            page_size,
        )
    }

    async fn mount_page(server: &MockServer, offset: &str, body: String) {
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn test_full_pages_then_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, "0", results_page(&[("/a/1", "One"), ("/a/2", "Two")])).await;
        mount_page(&server, "2", results_page(&[("/a/3", "Three"), ("/a/4", "Four")])).await;
        mount_page(&server, "4", results_page(&[("/a/5", "Five"), ("/a/1", "One")])).await;
        mount_page(&server, "6", results_page(&[])).await;

        let discovery = Discovery::Predictive(offset_search(&server, 2));
        let articles = discovery
            .discover(&client(), &keywords(&["nsa"]), &range(), &DiscoveryLimits::default())
            .await;

        assert_eq!(articles.len(), 5);
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
        let one = &articles[&format!("{}/a/1", server.uri())];
        assert_eq!(one.title, "One");
    }

    #[tokio::test]
    async fn test_snowden_scenario() {
        let server = MockServer::start().await;
        mount_page(&server, "0", results_page(&[("/u1", "t1"), ("/u2", "t2")])).await;
        mount_page(&server, "2", results_page(&[("/u3", "t3")])).await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("offset", "4"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[])))
            .mount(&server)
            .await;

        let discovery = Discovery::Predictive(offset_search(&server, 2));
        let articles = discovery
            .discover(&client(), &keywords(&["Snowden"]), &range(), &DiscoveryLimits::default())
            .await;

        assert_eq!(articles.len(), 3);
        let expected: BTreeSet<String> = ["Snowden".to_string()].into();
        for (url, title) in [("/u1", "t1"), ("/u2", "t2"), ("/u3", "t3")] {
            let article = &articles[&format!("{}{url}", server.uri())];
            assert_eq!(article.title, title);
            assert_eq!(article.keywords(), &expected);
        }
        // The short second page ends the search before the empty page.
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_short_page_continue_reaches_empty_page() {
        let server = MockServer::start().await;
        mount_page(&server, "0", results_page(&[("/u1", "t1")])).await;
        mount_page(&server, "2", results_page(&[("/u2", "t2")])).await;
        mount_page(&server, "4", results_page(&[])).await;

        let search = offset_search(&server, 2).on_short_page(ShortPage::Continue.hook());
        let articles = Discovery::Predictive(search)
            .discover(&client(), &keywords(&["nsa"]), &range(), &DiscoveryLimits::default())
            .await;

        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_keywords_union_on_repeated_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[("/same", "Same")])))
            .mount(&server)
            .await;

        let articles = Discovery::Predictive(offset_search(&server, 2))
            .discover(&client(), &keywords(&["A", "B"]), &range(), &DiscoveryLimits::default())
            .await;

        assert_eq!(articles.len(), 1);
        let article = articles.values().next().unwrap();
        assert_eq!(
            article.keywords().iter().cloned().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[tokio::test]
    async fn test_failed_page_ends_only_that_keyword() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "fine"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[("/ok", "Ok")])))
            .mount(&server)
            .await;

        let articles = Discovery::Predictive(offset_search(&server, 2))
            .discover(
                &client(),
                &keywords(&["broken", "fine"]),
                &range(),
                &DiscoveryLimits::default(),
            )
            .await;

        assert_eq!(articles.len(), 1);
        assert!(articles.values().all(|a| a.keywords().contains("fine")));
    }

    #[tokio::test]
    async fn test_max_pages_bounds_the_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(results_page(&[("/x", "x"), ("/y", "y")])),
            )
            .mount(&server)
            .await;

        let limits = DiscoveryLimits {
            deadline: None,
            max_pages: Some(3),
        };
        Discovery::Predictive(offset_search(&server, 2))
            .discover(&client(), &keywords(&["nsa"]), &range(), &limits)
            .await;

        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_expired_deadline_requests_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[("/x", "x")])))
            .expect(0)
            .mount(&server)
            .await;

        let limits = DiscoveryLimits {
            deadline: Some(Duration::ZERO),
            max_pages: None,
        };
        let articles = Discovery::Predictive(offset_search(&server, 2))
            .discover(&client(), &keywords(&["nsa", "gchq"]), &range(), &limits)
            .await;
        assert!(articles.is_empty());
    }

    fn paged_body(hits: &[(&str, &str)], next: Option<&str>) -> String {
        let items: String = hits
            .iter()
            .map(|(url, title)| format!(r#"<li><a href="{url}">{title}</a></li>"#))
            .collect();
        let next = next
            .map(|href| format!(r#"<div class="pagination"><a class="next" href="{href}">»</a></div>"#))
            .unwrap_or_default();
        format!(r#"<html><body><ul class="results">{items}</ul>{next}</body></html>"#)
    }

    #[tokio::test]
    async fn test_reactive_follows_next_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(paged_body(
                &[("/r/1", "1"), ("/r/2", "2")],
                Some("/search/page/2"),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/page/2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(paged_body(
                &[("/r/3", "3"), ("/r/4", "4")],
                Some("/search/page/3"),
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search/page/3"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(paged_body(&[("/r/5", "5"), ("/r/6", "6")], None)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let base = server.uri();
        let search = ReactiveSearch::new(
            Arc::new(move |q: &SearchQuery<'_>| format!("{base}/search?q={}", q.encoded_keyword())),
            HitRules::new("ul.results li", "a", "a").unwrap(),
            2,
            NextPage::link("div.pagination a.next").unwrap(),
        );
        let articles = Discovery::Reactive(search)
            .discover(&client(), &keywords(&["nsa"]), &range(), &DiscoveryLimits::default())
            .await;

        assert_eq!(articles.len(), 6);
    }

    #[tokio::test]
    async fn test_reactive_stops_when_next_repeats_current() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200).set_body_string(paged_body(
                &[("/r/1", "1"), ("/r/2", "2")],
                Some("/search?q=nsa"),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let base = server.uri();
        let search = ReactiveSearch::new(
            Arc::new(move |q: &SearchQuery<'_>| format!("{base}/search?q={}", q.encoded_keyword())),
            rules(),
            2,
            NextPage::link("div.pagination a.next").unwrap(),
        );
        let articles = Discovery::Reactive(search)
            .discover(&client(), &keywords(&["nsa"]), &range(), &DiscoveryLimits::default())
            .await;

        assert_eq!(articles.len(), 2);
    }

    #[tokio::test]
    async fn test_reactive_custom_next_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[("/c/1", "1")])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&[])))
            .expect(1)
            .mount(&server)
            .await;

        let base = server.uri();
        let next_base = base.clone();
        let next: NextPageFn = Arc::new(move |ctx: &NextPageContext<'_>| {
            Some(format!("{next_base}/search?page={}", ctx.pages_fetched + 1))
        });
        let search = ReactiveSearch::new(
            Arc::new(move |_: &SearchQuery<'_>| format!("{base}/search?page=1")),
            rules(),
            1,
            NextPage::Custom(next),
        );
        let articles = Discovery::Reactive(search)
            .discover(&client(), &keywords(&["nsa"]), &range(), &DiscoveryLimits::default())
            .await;

        assert_eq!(articles.len(), 1);
    }
}
