//! Frankfurter Allgemeine search.
//!
//! Older results are not linked, only an archive purchase link is shown.
//! That link carries the article id, and the print view of the article is
//! reachable under the id directly.

use super::{Provider, ProviderId};
use crate::dates::{DateFormat, DateLocale};
use crate::discovery::{Discovery, PredictiveSearch, SearchQuery, UrlBuilder};
use crate::errors::ConfigError;
use crate::extract::{DateRule, ExtractionRules, HitRules, UrlFallback, selector};
use scraper::{ElementRef, Selector};
use std::sync::Arc;
use url::Url;

const SEARCH_URL: &str = "http://www.faz.net/suche/";
const ARTICLE_URL: &str = "http://www.faz.net/-";
const PAGE_SIZE: usize = 80;

fn search_url() -> UrlBuilder {
    Arc::new(|q: &SearchQuery<'_>| {
        format!(
            "{SEARCH_URL}s{}.html?BTyp=redaktionelleInhalte&chkBoxType_2=on&sort=date\
             &query={}&from={}&to={}&resultsPerPage={}",
            q.page() + 1,
            q.encoded_keyword(),
            q.range.first_day().format("%d.%m.%Y"),
            q.range.last_day().format("%d.%m.%Y"),
            q.limit,
        )
    })
}

/// Article id from an archive link such as `...?artikelId=FAZ.123.456`.
fn archive_id(href: &str) -> Option<String> {
    let id = href.split('=').nth(1)?.replace('.', "");
    (!id.is_empty()).then_some(id)
}

fn archive_fallback(archive_link: Selector) -> UrlFallback {
    Arc::new(move |hit: &ElementRef<'_>, _base: &Url| {
        let link = hit.select(&archive_link).next()?;
        let id = archive_id(link.value().attr("href")?)?;
        Some(format!("{ARTICLE_URL}{id}.html?printPagedArticle=true"))
    })
}

fn rules() -> Result<ExtractionRules, ConfigError> {
    Ok(ExtractionRules::new()
        .subtitle(r#"div.Artikel div.FAZArtikelEinleitung [itemprop="description"]"#)?
        .body(r#"div.Artikel [itemprop="articleBody"]"#)?
        .date(DateRule::attribute(
            r#"div.Artikel [itemprop="datePublished"]"#,
            "content",
            DateFormat::pattern("%Y-%m-%dT%H:%M:%S%z"),
            DateLocale::German,
        )?))
}

pub(super) fn provider() -> Result<Provider, ConfigError> {
    let hits = HitRules::new(
        "form#search div.SuchergebnisListe div.Teaser620",
        "a.TeaserHeadLink",
        "span.headline",
    )?
    .with_url_fallback(archive_fallback(selector("div.ArchivInfo a.ArchivLink")?));
    let search = PredictiveSearch::new(search_url(), hits, PAGE_SIZE);
    Ok(Provider::new(ProviderId::Faz, Discovery::Predictive(search)).with_extraction(rules()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::DateRange;
    use crate::extract::extract_hits;
    use chrono::{NaiveDate, TimeZone, Utc};

    const RESULTS: &str = r#"
        <form id="search"><div class="SuchergebnisListe">
          <div class="Teaser620">
            <a class="TeaserHeadLink" href="/aktuell/politik/nsa-12345.html"><span class="headline">Frei</span></a>
          </div>
          <div class="Teaser620">
            <span class="headline">Archiv</span>
            <div class="ArchivInfo"><a class="ArchivLink" href="http://fazarchiv.faz.net/?artikelId=FAZ.200.312">kaufen</a></div>
          </div>
          <div class="Teaser620"><span class="headline">Nichts</span></div>
        </div></form>
    "#;

    #[test]
    fn test_search_url() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2013, 6, 1).unwrap(),
            NaiveDate::from_ymd_opt(2013, 6, 30).unwrap(),
        )
        .unwrap();
        let url = search_url()(&SearchQuery {
            keyword: "NSA",
            range: &range,
            offset: 160,
            limit: 80,
        });
        assert_eq!(
            url,
            "http://www.faz.net/suche/s3.html?BTyp=redaktionelleInhalte&chkBoxType_2=on&sort=date\
             &query=NSA&from=01.06.2013&to=30.06.2013&resultsPerPage=80"
        );
    }

    #[test]
    fn test_archive_results_use_article_id() {
        let provider = provider().unwrap();
        let Discovery::Predictive(search) = &provider.discovery else {
            panic!("predictive search expected");
        };
        let base = Url::parse("http://www.faz.net/suche/s1.html").unwrap();
        let page = extract_hits(RESULTS, &base, &search.hits);

        assert_eq!(page.matched, 3);
        assert_eq!(page.hits.len(), 2);
        assert_eq!(page.hits[0].url, "http://www.faz.net/aktuell/politik/nsa-12345.html");
        assert_eq!(
            page.hits[1].url,
            "http://www.faz.net/-FAZ200312.html?printPagedArticle=true"
        );
        assert_eq!(page.hits[1].title, "Archiv");
    }

    #[test]
    fn test_archive_id() {
        assert_eq!(archive_id("?artikelId=FAZ.200.312").as_deref(), Some("FAZ200312"));
        assert_eq!(archive_id("/no-id"), None);
        assert_eq!(archive_id("?artikelId="), None);
    }

    #[test]
    fn test_article_page() {
        let page = r#"
            <div class="Artikel">
              <div class="FAZArtikelEinleitung"><p itemprop="description">Einleitung.</p></div>
              <meta itemprop="datePublished" content="2013-06-10T18:42:00+0200">
              <div itemprop="articleBody"><p>Text.</p></div>
            </div>
        "#;
        let fields = rules().unwrap().extract(page);
        assert_eq!(fields.subtitle.as_deref(), Some("Einleitung."));
        assert_eq!(fields.full_text.as_deref(), Some("Text."));
        assert_eq!(
            fields.published,
            Ok(Some(Utc.with_ymd_and_hms(2013, 6, 10, 16, 42, 0).unwrap()))
        );
    }
}
