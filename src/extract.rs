//! Document queries used by discovery and population.
//!
//! Everything a provider knows about its markup lives here as data: which
//! elements on a search page are results, where a result keeps its link and
//! headline, and which regions of an article page hold the subtitle, body and
//! publication date. Selectors are compiled once when a provider is built, so
//! an invalid selector is a configuration error rather than a runtime one.
//!
//! `scraper::Html` is not `Send`. Every function here parses and queries a
//! document synchronously and returns owned data, which keeps documents out
//! of the async state machines that call them.

use crate::dates::{DateFormat, DateLocale, parse_date};
use crate::errors::{ConfigError, DateParseError};
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Compiles a CSS selector, reporting failures as configuration errors.
pub fn selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// Joins the text nodes below `element`, collapsing runs of whitespace.
pub fn element_text(element: &ElementRef) -> String {
    normalize_whitespace(element.text())
}

/// Joins the text nodes that are direct children of `element`.
pub fn own_text(element: &ElementRef) -> String {
    normalize_whitespace(
        element
            .children()
            .filter_map(|child| child.value().as_text().map(|text| &**text)),
    )
}

/// Collapses whitespace across a sequence of text fragments.
pub fn normalize_whitespace<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of every element matching `selector`, joined with single spaces.
pub fn select_text(document: &Html, selector: &Selector) -> String {
    normalize_whitespace(document.select(selector).flat_map(|element| element.text()))
}

/// Outer markup of every element matching `selector`, one per line.
pub fn select_html(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .map(|element| element.html())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Plain text of a markup fragment.
pub fn html_to_text(markup: &str) -> String {
    let fragment = Html::parse_fragment(markup);
    normalize_whitespace(fragment.root_element().text())
}

/// Resolves the `href` of `element` against `base`.
pub fn absolute_href(element: &ElementRef, base: &Url) -> Option<String> {
    let href = element.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok().map(String::from)
}

/// How the title of a search hit is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleText {
    /// All text below the matched elements.
    #[default]
    All,
    /// Only text nodes that are direct children of the first matched element,
    /// skipping overlines and department labels nested inside the link.
    Own,
}

/// Derives an article URL from a search hit when the link selector finds
/// nothing, e.g. for paywalled results that only link to an archive page.
pub type UrlFallback = Arc<dyn Fn(&ElementRef, &Url) -> Option<String> + Send + Sync>;

/// Where URL and title of each search hit are found.
#[derive(Clone)]
pub struct HitRules {
    pub results: Selector,
    pub url: Selector,
    pub title: Selector,
    pub title_text: TitleText,
    pub url_fallback: Option<UrlFallback>,
}

impl HitRules {
    pub fn new(results: &str, url: &str, title: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            results: selector(results)?,
            url: selector(url)?,
            title: selector(title)?,
            title_text: TitleText::All,
            url_fallback: None,
        })
    }

    pub fn with_own_title_text(mut self) -> Self {
        self.title_text = TitleText::Own;
        self
    }

    pub fn with_url_fallback(mut self, fallback: UrlFallback) -> Self {
        self.url_fallback = Some(fallback);
        self
    }

    /// URL of a single hit, or `None` when it cannot be determined.
    pub fn hit_url(&self, hit: &ElementRef, base: &Url) -> Option<String> {
        hit.select(&self.url)
            .next()
            .and_then(|link| absolute_href(&link, base))
            .or_else(|| {
                self.url_fallback
                    .as_ref()
                    .and_then(|fallback| fallback(hit, base))
            })
    }

    /// Title of a single hit.
    pub fn hit_title(&self, hit: &ElementRef) -> String {
        match self.title_text {
            TitleText::All => {
                normalize_whitespace(hit.select(&self.title).flat_map(|element| element.text()))
            }
            TitleText::Own => hit
                .select(&self.title)
                .next()
                .map(|element| own_text(&element))
                .unwrap_or_default(),
        }
    }
}

impl fmt::Debug for HitRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HitRules")
            .field("title_text", &self.title_text)
            .field("url_fallback", &self.url_fallback.is_some())
            .finish_non_exhaustive()
    }
}

/// One search result as found on a results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub url: String,
    pub title: String,
}

/// Outcome of reading one search results page.
#[derive(Debug, Default)]
pub struct HitPage {
    /// Number of elements matched by the results selector.
    pub matched: usize,
    /// Hits whose URL could be determined, in page order.
    pub hits: Vec<Hit>,
}

/// Parses a results page and extracts its hits.
#[cfg(test)]
pub fn extract_hits(body: &str, page_url: &Url, rules: &HitRules) -> HitPage {
    let document = Html::parse_document(body);
    hits_in(&document, page_url, rules)
}

/// Extracts the hits of an already parsed results page.
pub fn hits_in(document: &Html, page_url: &Url, rules: &HitRules) -> HitPage {
    let mut page = HitPage::default();
    for hit in document.select(&rules.results) {
        page.matched += 1;
        match rules.hit_url(&hit, page_url) {
            Some(url) => page.hits.push(Hit {
                url,
                title: rules.hit_title(&hit),
            }),
            None => tracing::debug!(page = %page_url, "Search hit without usable link; skipping"),
        }
    }
    page
}

/// Where a publication date is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateSource {
    /// The text of the matched element.
    Text,
    /// An attribute of the matched element, e.g. `datetime` or `content`.
    Attribute(String),
}

/// One way of finding and parsing a publication date.
#[derive(Debug, Clone)]
pub struct DateRule {
    pub selector: Selector,
    pub source: DateSource,
    pub format: DateFormat,
    pub locale: DateLocale,
}

impl DateRule {
    pub fn text(css: &str, format: DateFormat, locale: DateLocale) -> Result<Self, ConfigError> {
        Ok(Self {
            selector: selector(css)?,
            source: DateSource::Text,
            format,
            locale,
        })
    }

    pub fn attribute(
        css: &str,
        attribute: &str,
        format: DateFormat,
        locale: DateLocale,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            selector: selector(css)?,
            source: DateSource::Attribute(attribute.to_string()),
            format,
            locale,
        })
    }

    /// The raw date string, if the selector matches an element that carries
    /// one.
    fn raw_value(&self, document: &Html) -> Option<String> {
        let element = document.select(&self.selector).next()?;
        let value = match &self.source {
            DateSource::Text => element_text(&element),
            DateSource::Attribute(name) => element.value().attr(name)?.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }
}

/// Replaces the rule-based date lookup for providers that expose structured
/// timestamps in their own way.
pub type DateExtractor =
    Arc<dyn Fn(&Html) -> Result<Option<DateTime<Utc>>, DateParseError> + Send + Sync>;

/// Where the fields of an article page live.
#[derive(Clone, Default)]
pub struct ExtractionRules {
    pub subtitle: Option<Selector>,
    pub body: Option<Selector>,
    /// Tried in order; the first rule whose selector finds a value decides.
    pub dates: Vec<DateRule>,
    pub date_override: Option<DateExtractor>,
}

impl ExtractionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subtitle(mut self, css: &str) -> Result<Self, ConfigError> {
        self.subtitle = Some(selector(css)?);
        Ok(self)
    }

    pub fn body(mut self, css: &str) -> Result<Self, ConfigError> {
        self.body = Some(selector(css)?);
        Ok(self)
    }

    pub fn date(mut self, rule: DateRule) -> Self {
        self.dates.push(rule);
        self
    }

    pub fn date_override(mut self, extractor: DateExtractor) -> Self {
        self.date_override = Some(extractor);
        self
    }

    /// Reads every field this rule set knows about from an article page.
    pub fn extract(&self, body: &str) -> ArticleFields {
        let document = Html::parse_document(body);

        let subtitle = self
            .subtitle
            .as_ref()
            .map(|sel| select_text(&document, sel));
        let full_text = self.body.as_ref().map(|sel| select_text(&document, sel));
        let full_text_html = self.body.as_ref().map(|sel| select_html(&document, sel));
        let published = match &self.date_override {
            Some(extractor) => extractor(&document),
            None => self.rule_date(&document),
        };

        ArticleFields {
            subtitle,
            full_text,
            full_text_html,
            published,
        }
    }

    fn rule_date(&self, document: &Html) -> Result<Option<DateTime<Utc>>, DateParseError> {
        for rule in &self.dates {
            if let Some(raw) = rule.raw_value(document) {
                return parse_date(&raw, &rule.format, rule.locale).map(Some);
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for ExtractionRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionRules")
            .field("subtitle", &self.subtitle.is_some())
            .field("body", &self.body.is_some())
            .field("dates", &self.dates.len())
            .field("date_override", &self.date_override.is_some())
            .finish()
    }
}

/// Field values read from one article page.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleFields {
    pub subtitle: Option<String>,
    pub full_text: Option<String>,
    pub full_text_html: Option<String>,
    pub published: Result<Option<DateTime<Utc>>, DateParseError>,
}
