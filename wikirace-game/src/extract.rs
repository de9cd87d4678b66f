//! Title and link extraction from article markup.
//!
//! Only the article body (`div#mw-content-text`) is scanned, so navigation
//! boxes and sidebars never contribute candidates. Missing elements mean
//! "no data"; extraction itself cannot fail.

use crate::page::{normalize_url, Candidate, Page, UNKNOWN_TITLE};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

const ARTICLE_PREFIX: &str = "/wiki/";

/// Turns article HTML into a title plus ordered link candidates
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    base: Url,
}

impl LinkExtractor {
    /// `base` is the site root that `/wiki/...` hrefs are resolved against.
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn extract(&self, html: &str, current_url: &str) -> Page {
        let doc = Html::parse_document(html);
        let title = page_title(&doc);

        let content = Selector::parse("div#mw-content-text")
            .ok()
            .and_then(|sel| doc.select(&sel).next());
        let candidates = match content {
            Some(content) => self.candidates(content, &normalize_url(current_url)),
            None => Vec::new(),
        };

        Page { title, candidates }
    }

    fn candidates(&self, content: ElementRef<'_>, current_url: &str) -> Vec<Candidate> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let mut out = Vec::new();

        for link in content.select(&selector) {
            let href = link.value().attr("href").unwrap_or("").trim();
            let text = link.text().collect::<String>();
            let text = text.trim();

            if href.is_empty() || text.is_empty() {
                continue;
            }
            if is_citation_marker(text) || text.chars().count() <= 2 {
                continue;
            }
            if !is_article_href(href) {
                continue;
            }

            let Ok(mut url) = self.base.join(href) else {
                continue;
            };
            url.set_fragment(None);
            let url = url.to_string();

            if url == current_url || !seen.insert(url.clone()) {
                continue;
            }
            out.push(Candidate::new(text, url));
        }

        out
    }
}

fn page_title(doc: &Html) -> String {
    Selector::parse("h1.firstHeading")
        .ok()
        .and_then(|sel| doc.select(&sel).next())
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| UNKNOWN_TITLE.to_string())
}

/// `[1]`, `[a]`, `[potrzebny przypis]`
fn is_citation_marker(text: &str) -> bool {
    text.starts_with('[') && text.ends_with(']')
}

/// An intra-wiki article link: `/wiki/Name` with no namespace (`Kategoria:`,
/// `Plik:`, `Special:`, ...).
fn is_article_href(href: &str) -> bool {
    match href.strip_prefix(ARTICLE_PREFIX) {
        Some(rest) => !rest.is_empty() && !rest.contains(':'),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://pl.wikipedia.org";
    const CURRENT: &str = "https://pl.wikipedia.org/wiki/Wis%C5%82a";

    fn extractor() -> LinkExtractor {
        LinkExtractor::new(Url::parse(BASE).unwrap())
    }

    fn article(body: &str) -> String {
        format!(
            r#"<html><body>
            <div id="mw-navigation"><a href="/wiki/Strona_g%C5%82%C3%B3wna">Strona główna</a></div>
            <h1 id="firstHeading" class="firstHeading"><span class="mw-page-title-main">Wisła</span></h1>
            <div id="mw-content-text">{}</div>
            </body></html>"#,
            body
        )
    }

    fn texts(page: &Page) -> Vec<&str> {
        page.candidates.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_title_and_document_order() {
        let html = article(
            r#"<p><a href="/wiki/Krak%C3%B3w">Kraków</a> leży nad
            <a href="/wiki/Morze_Ba%C5%82tyckie">Morze Bałtyckie</a> i
            <a href="/wiki/Warszawa">Warszawa</a></p>"#,
        );
        let page = extractor().extract(&html, CURRENT);

        assert_eq!(page.title, "Wisła");
        assert_eq!(texts(&page), vec!["Kraków", "Morze Bałtyckie", "Warszawa"]);
        assert_eq!(page.candidates[0].url, "https://pl.wikipedia.org/wiki/Krak%C3%B3w");
    }

    #[test]
    fn test_skips_sidebar_links() {
        let page = extractor().extract(&article(""), CURRENT);
        assert!(page.candidates.is_empty());
    }

    #[test]
    fn test_filters_noise() {
        let html = article(
            r#"<a href="/wiki/Przypis">[1]</a>
            <a href="/wiki/Przypis_b">[potrzebny przypis]</a>
            <a href="/wiki/PL">PL</a>
            <a href="/wiki/Kategoria:Rzeki">Rzeki w Polsce</a>
            <a href="/wiki/Plik:Wisla.jpg">Zdjęcie rzeki</a>
            <a href="https://example.com/wiki/Obca">Obca strona</a>
            <a href="/w/index.php?title=Wis%C5%82a&action=edit">Edytuj stronę</a>
            <a href="">Pusty odnośnik</a>
            <a href="/wiki/Pusty"> </a>
            <a href="/wiki/Wis%C5%82a">Wisła</a>
            <a href="/wiki/Wis%C5%82a#Dorzecze">dorzecze</a>
            <a href="/wiki/Gda%C5%84sk">Gdańsk</a>"#,
        );
        let page = extractor().extract(&html, CURRENT);

        assert_eq!(texts(&page), vec!["Gdańsk"]);
    }

    #[test]
    fn test_three_char_text_kept() {
        let html = article(r#"<a href="/wiki/ONZ">ONZ</a><a href="/wiki/UE">UE</a>"#);
        let page = extractor().extract(&html, CURRENT);
        // Length is counted in characters, not bytes.
        let html2 = article(r#"<a href="/wiki/%C5%81%C3%B3d%C5%BA">Łó</a>"#);

        assert_eq!(texts(&page), vec!["ONZ"]);
        assert!(extractor().extract(&html2, CURRENT).candidates.is_empty());
    }

    #[test]
    fn test_nested_anchor_text() {
        let html = article(r#"<a href="/wiki/Toru%C5%84"><b>Toruń</b> (miasto)</a>"#);
        let page = extractor().extract(&html, CURRENT);
        assert_eq!(texts(&page), vec!["Toruń (miasto)"]);
    }

    #[test]
    fn test_duplicates_keep_first() {
        let html = article(
            r#"<a href="/wiki/Krak%C3%B3w">Kraków</a>
            <a href="/wiki/Krak%C3%B3w#Historia">historia Krakowa</a>"#,
        );
        let page = extractor().extract(&html, CURRENT);
        assert_eq!(texts(&page), vec!["Kraków"]);
    }

    #[test]
    fn test_missing_title_and_content() {
        let page = extractor().extract("<html><body><p>nothing</p></body></html>", CURRENT);
        assert_eq!(page.title, UNKNOWN_TITLE);
        assert!(page.candidates.is_empty());
    }

    #[test]
    fn test_malformed_markup() {
        let html = r#"<h1 class="firstHeading">Odra<div id="mw-content-text"><a href="/wiki/Szczecin">Szczecin"#;
        let page = extractor().extract(html, CURRENT);
        assert!(page.title.starts_with("Odra"));
        assert_eq!(texts(&page), vec!["Szczecin"]);
    }

    #[test]
    fn test_article_href() {
        assert!(is_article_href("/wiki/Rust_(j%C4%99zyk_programowania)"));
        assert!(!is_article_href("/wiki/Talk:Rust"));
        assert!(!is_article_href("/wiki/"));
        assert!(!is_article_href("//pl.wikipedia.org/wiki/Rust"));
    }
}
