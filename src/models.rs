//! Data models for discovered articles and the results of a run.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - [`Article`]: A candidate record, created at discovery time and filled in
//!   by the populator
//! - [`ArticleMap`]: All candidates of one provider, keyed by URL
//! - [`RunResult`]: The per-provider collections produced by one run
//!
//! The URL is the identity of an article. It is fixed at construction and is
//! the key under which the article lives in an [`ArticleMap`].

use crate::providers::ProviderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Articles of one provider keyed by their URL.
pub type ArticleMap = HashMap<String, Article>;

/// Articles of every provider that took part in a run.
pub type RunResult = BTreeMap<ProviderId, ArticleMap>;

/// A single news article in its normalized form.
///
/// Fields other than `url` and `title` start out empty and are filled at most
/// once: a field that already holds a non-empty value is never overwritten.
/// Records built from API responses therefore keep the values the API gave
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    url: String,
    /// The headline as shown in the search result.
    pub title: String,
    /// The standfirst or teaser text.
    pub subtitle: Option<String>,
    /// The publication timestamp, initial publication preferred over updates.
    pub published: Option<DateTime<Utc>>,
    /// The body as plain text.
    pub full_text: Option<String>,
    /// The body as markup.
    pub full_text_html: Option<String>,
    keywords: BTreeSet<String>,
    #[serde(skip)]
    populated: bool,
}

impl Article {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            subtitle: None,
            published: None,
            full_text: None,
            full_text_html: None,
            keywords: BTreeSet::new(),
            populated: false,
        }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.add_keyword(keyword);
        self
    }

    pub fn with_subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = non_empty(subtitle);
        self
    }

    pub fn with_published(mut self, published: Option<DateTime<Utc>>) -> Self {
        self.published = published;
        self
    }

    pub fn with_full_text(mut self, text: Option<String>, html: Option<String>) -> Self {
        self.full_text = non_empty(text);
        self.full_text_html = non_empty(html);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    /// Adds a keyword. The keyword set only ever grows.
    pub fn add_keyword(&mut self, keyword: impl Into<String>) {
        self.keywords.insert(keyword.into());
    }

    /// Whether every field the populator could fill already holds a value.
    pub fn is_complete(&self) -> bool {
        is_set(&self.subtitle)
            && is_set(&self.full_text)
            && is_set(&self.full_text_html)
            && self.published.is_some()
    }

    /// Whether the population step ran successfully for this article.
    pub fn is_populated(&self) -> bool {
        self.populated
    }

    pub(crate) fn mark_populated(&mut self) {
        self.populated = true;
    }
}

/// Inserts a discovered article or, if its URL is already known, merges its
/// keywords into the existing record.
///
/// Returns `true` when the URL was new.
pub fn merge_article(articles: &mut ArticleMap, article: Article) -> bool {
    match articles.get_mut(article.url()) {
        Some(existing) => {
            existing.keywords.extend(article.keywords);
            false
        }
        None => {
            articles.insert(article.url.clone(), article);
            true
        }
    }
}

/// Stores `value` in `slot` unless the slot already holds a non-empty string
/// or the value itself is empty.
pub fn fill(slot: &mut Option<String>, value: String) {
    if !is_set(slot) && !value.trim().is_empty() {
        *slot = Some(value);
    }
}

fn is_set(slot: &Option<String>) -> bool {
    slot.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_article_creation() {
        let article = Article::new("https://example.com/a", "Title").with_keyword("NSA");
        assert_eq!(article.url(), "https://example.com/a");
        assert_eq!(article.title, "Title");
        assert!(article.keywords().contains("NSA"));
        assert!(!article.is_populated());
        assert!(!article.is_complete());
    }

    #[test]
    fn test_merge_unions_keywords() {
        let mut articles = ArticleMap::new();
        assert!(merge_article(
            &mut articles,
            Article::new("u1", "t1").with_keyword("A")
        ));
        assert!(!merge_article(
            &mut articles,
            Article::new("u1", "another title").with_keyword("B")
        ));

        assert_eq!(articles.len(), 1);
        let article = &articles["u1"];
        assert_eq!(article.title, "t1");
        assert_eq!(
            article.keywords().iter().cloned().collect::<Vec<_>>(),
            vec!["A".to_string(), "B".to_string()]
        );
    }

    #[test]
    fn test_fill_never_overwrites() {
        let mut slot = Some("kept".to_string());
        fill(&mut slot, "replacement".to_string());
        assert_eq!(slot.as_deref(), Some("kept"));

        let mut empty = Some(String::new());
        fill(&mut empty, "value".to_string());
        assert_eq!(empty.as_deref(), Some("value"));

        let mut none = None;
        fill(&mut none, "   ".to_string());
        assert_eq!(none, None);
    }

    #[test]
    fn test_builders_drop_empty_values() {
        let article = Article::new("u", "t")
            .with_subtitle(Some(String::new()))
            .with_full_text(Some("text".to_string()), Some(" ".to_string()));
        assert_eq!(article.subtitle, None);
        assert_eq!(article.full_text.as_deref(), Some("text"));
        assert_eq!(article.full_text_html, None);
    }

    #[test]
    fn test_is_complete() {
        let article = Article::new("u", "t")
            .with_subtitle(Some("s".to_string()))
            .with_full_text(Some("text".to_string()), Some("<p>text</p>".to_string()))
            .with_published(Some(Utc.with_ymd_and_hms(2014, 1, 5, 12, 0, 0).unwrap()));
        assert!(article.is_complete());
    }

    #[test]
    fn test_article_serialization() {
        let article = Article::new("https://example.com/a", "Title")
            .with_keyword("Snowden")
            .with_published(Some(Utc.with_ymd_and_hms(2014, 1, 5, 12, 0, 0).unwrap()));

        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("\"url\":\"https://example.com/a\""));
        assert!(json.contains("2014-01-05T12:00:00Z"));
        assert!(json.contains("Snowden"));
        assert!(!json.contains("populated"));
    }
}
