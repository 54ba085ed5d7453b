//! Pre- and post-population filters.
//!
//! A pre-filter only sees a candidate's URL and runs before any article page
//! is fetched, so it is the cheap place to drop galleries, videos and other
//! non-article links. A post-filter sees the populated record and decides on
//! content, most commonly the publication date.
//!
//! Both kinds are plain shared closures so that providers can compose them
//! freely; applying a filter always builds a new map.

use crate::dates::DateRange;
use crate::errors::ConfigError;
use crate::models::{Article, ArticleMap};
use itertools::Itertools;
use regex::Regex;
use std::sync::Arc;
use tracing::debug;

/// Keeps a candidate when it returns `true` for the candidate's URL.
pub type PreFilter = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Keeps a record when it returns `true` for the populated record.
pub type PostFilter = Arc<dyn Fn(&Article) -> bool + Send + Sync>;

/// Builds a provider's post-filter for the date range of a run.
pub type PostFilterFactory = Arc<dyn Fn(&DateRange) -> PostFilter + Send + Sync>;

/// What the date filter does with a record that has no publication date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingDate {
    Reject,
    Keep,
}

/// Rejects URLs ending in one of `suffixes`.
pub fn reject_url_suffixes<I, S>(suffixes: I) -> PreFilter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let suffixes: Vec<String> = suffixes.into_iter().map(Into::into).collect();
    Arc::new(move |url: &str| !suffixes.iter().any(|suffix| url.ends_with(suffix.as_str())))
}

/// Rejects URLs starting with one of `prefixes`.
pub fn reject_url_prefixes<I, S>(prefixes: I) -> PreFilter
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).collect();
    Arc::new(move |url: &str| {
        !prefixes
            .iter()
            .any(|prefix| url.starts_with(prefix.as_str()))
    })
}

/// Rejects URLs that fully match one of `patterns`.
///
/// Duplicate patterns are compiled once. An invalid pattern is a
/// configuration error.
pub fn reject_url_patterns<I, S>(patterns: I) -> Result<PreFilter, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let compiled = patterns
        .into_iter()
        .map(|pattern| pattern.as_ref().to_string())
        .unique()
        .map(|pattern| {
            Regex::new(&format!("^(?:{pattern})$"))
                .map_err(|source| ConfigError::InvalidPattern { pattern, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Arc::new(move |url: &str| {
        !compiled.iter().any(|re| re.is_match(url))
    }))
}

/// Keeps URLs accepted by every filter in `filters`.
pub fn all_pre(filters: Vec<PreFilter>) -> PreFilter {
    Arc::new(move |url: &str| filters.iter().all(|filter| filter(url)))
}

/// Keeps records published within `range`.
pub fn publication_date_filter(range: DateRange, missing: MissingDate) -> PostFilter {
    Arc::new(move |article: &Article| match &article.published {
        Some(published) => range.contains(published),
        None => missing == MissingDate::Keep,
    })
}

/// Factory for [`publication_date_filter`] with a fixed missing-date policy.
pub fn date_filter_factory(missing: MissingDate) -> PostFilterFactory {
    Arc::new(move |range: &DateRange| publication_date_filter(*range, missing))
}

/// Returns the candidates whose URL passes `filter`. Without a filter every
/// candidate is kept.
pub fn apply_pre_filter(articles: ArticleMap, filter: Option<&PreFilter>) -> ArticleMap {
    let Some(filter) = filter else {
        return articles;
    };
    let before = articles.len();
    let kept: ArticleMap = articles
        .into_iter()
        .filter(|(url, _)| filter(url.as_str()))
        .collect();
    debug!(before, after = kept.len(), "Applied pre-population filter");
    kept
}

/// Returns the records that passed population and `filter`.
///
/// Records whose population failed never pass a post-filter. Without a filter
/// every record is kept.
pub fn apply_post_filter(articles: ArticleMap, filter: Option<&PostFilter>) -> ArticleMap {
    let Some(filter) = filter else {
        return articles;
    };
    let before = articles.len();
    let kept: ArticleMap = articles
        .into_iter()
        .filter(|(_, article)| article.is_populated() && filter(article))
        .collect();
    debug!(before, after = kept.len(), "Applied post-population filter");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2014, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2014, 1, 31).unwrap(),
        )
        .unwrap()
    }

    fn populated(url: &str, published: Option<chrono::DateTime<Utc>>) -> Article {
        let mut article = Article::new(url, "t").with_published(published);
        article.mark_populated();
        article
    }

    fn map(articles: Vec<Article>) -> ArticleMap {
        articles
            .into_iter()
            .map(|a| (a.url().to_string(), a))
            .collect()
    }

    #[test]
    fn test_suffix_and_prefix_filters() {
        let suffix = reject_url_suffixes([".ece", ".pdf"]);
        assert!(!suffix("https://www.mirror.co.uk/incoming/article2038719.ece"));
        assert!(suffix("https://www.mirror.co.uk/news/world-news/nsa-spying-2038720"));

        let prefix = reject_url_prefixes(["https://www.theguardian.com/media/video/"]);
        assert!(!prefix("https://www.theguardian.com/media/video/2014/jan/01/nsa"));
        assert!(prefix("https://www.theguardian.com/world/2014/jan/01/nsa"));
    }

    #[test]
    fn test_pattern_filter_requires_full_match() {
        let filter = reject_url_patterns([
            r"https://www\.stern\.de/fotostrecke/.*",
            r"https://www\.stern\.de/fotostrecke/.*",
        ])
        .unwrap();
        assert!(!filter("https://www.stern.de/fotostrecke/nsa-123.html"));
        assert!(filter("see https://www.stern.de/fotostrecke/nsa-123.html"));
        assert!(filter("https://www.stern.de/politik/nsa-123.html"));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        assert!(matches!(
            reject_url_patterns(["("]),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_all_pre_combines_filters() {
        let filter = all_pre(vec![
            reject_url_prefixes(["https://b.example/"]),
            reject_url_suffixes([".pdf"]),
        ]);
        assert!(filter("https://a.example/x.html"));
        assert!(!filter("https://a.example/x.pdf"));
        assert!(!filter("https://b.example/x.html"));
    }

    #[test]
    fn test_pre_filter_never_grows_the_map() {
        let articles = map(vec![
            Article::new("https://a.example/1.html", "1"),
            Article::new("https://a.example/2.pdf", "2"),
        ]);
        let filter = reject_url_suffixes([".pdf"]);
        let kept = apply_pre_filter(articles.clone(), Some(&filter));
        assert_eq!(kept.len(), 1);
        assert!(kept.keys().all(|url| articles.contains_key(url)));

        assert_eq!(apply_pre_filter(articles, None).len(), 2);
    }

    #[test]
    fn test_date_filter_bounds() {
        let filter = publication_date_filter(range(), MissingDate::Reject);
        let at = |y, m, d, h, min| Some(Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap());

        assert!(!filter(&populated("dec31", at(2013, 12, 31, 23, 59))));
        assert!(filter(&populated("jan1", at(2014, 1, 1, 0, 0))));
        assert!(filter(&populated("jan31", at(2014, 1, 31, 23, 59))));
        assert!(!filter(&populated("feb1", at(2014, 2, 1, 0, 0))));
        assert!(!filter(&populated("none", None)));

        let lenient = publication_date_filter(range(), MissingDate::Keep);
        assert!(lenient(&populated("none", None)));
    }

    #[test]
    fn test_post_filter_rejects_unpopulated_records() {
        let inside = Some(Utc.with_ymd_and_hms(2014, 1, 5, 12, 0, 0).unwrap());
        let articles = map(vec![
            populated("https://a.example/ok", inside),
            Article::new("https://a.example/failed", "t").with_published(inside),
        ]);
        let filter = date_filter_factory(MissingDate::Keep)(&range());

        let kept = apply_post_filter(articles.clone(), Some(&filter));
        assert_eq!(kept.len(), 1);
        assert!(kept.contains_key("https://a.example/ok"));

        assert_eq!(apply_post_filter(articles, None).len(), 2);
    }
}
