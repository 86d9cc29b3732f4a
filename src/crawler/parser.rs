//! HTML parsing for link and text extraction
//!
//! This module handles parsing fetched HTML to extract:
//! - Outbound links to other sites (from `<a href>` tags)
//! - Visible text content for keyword extraction
//!
//! Parsing is lenient: malformed markup yields whatever links or text can be
//! recovered, and a page with none is simply an empty result.

use crate::url::{canonicalize, same_site};
use scraper::{Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Elements whose text is never part of the page content
const SKIPPED_TEXT_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Extracts canonical links that point to a different site than `base_url`
///
/// # Link Extraction Rules
///
/// - Every `<a href="...">` is resolved against `base_url`
/// - `javascript:`, `mailto:`, `tel:` and `data:` links are discarded, along
///   with anything that does not resolve to HTTP(S)
/// - Links to the same host and port as `base_url` are internal and dropped
/// - The rest are canonicalized and deduplicated, keeping document order
///
/// # Example
///
/// ```
/// use trawl::crawler::extract_external_links;
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><a href="https://other.test/a?b=1">Other</a>"#;
/// let base = Url::parse("https://example.test/page").unwrap();
/// let links = extract_external_links(html, &base);
/// assert_eq!(links, vec!["https://other.test/a".to_string()]);
/// ```
pub fn extract_external_links(html: &str, base_url: &Url) -> Vec<String> {
    let Ok(anchor_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(absolute) = resolve_link(href, base_url) else {
            continue;
        };
        if same_site(&absolute, base_url) {
            continue;
        }
        if let Ok(canonical) = canonicalize(absolute.as_str()) {
            if seen.insert(canonical.clone()) {
                links.push(canonical);
            }
        }
    }

    links
}

/// Extracts the visible text of an HTML document
///
/// Text nodes are trimmed and joined with single spaces. Contents of
/// `script`, `style` and `noscript` elements are skipped.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| SKIPPED_TEXT_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        let trimmed = text.trim();
        if !trimmed.is_empty() {
            parts.push(trimmed);
        }
    }

    parts.join(" ")
}

/// Resolves a link href to an absolute HTTP(S) URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_url() -> Url {
        Url::parse("http://a.test/x").unwrap()
    }

    #[test]
    fn test_external_absolute_link() {
        let html = r#"<html><body><a href="http://b.test/y">Link</a></body></html>"#;
        assert_eq!(
            extract_external_links(html, &base_url()),
            vec!["http://b.test/y"]
        );
    }

    #[test]
    fn test_internal_links_dropped() {
        let html = r#"
            <a href="/internal">Relative</a>
            <a href="other">Path</a>
            <a href="http://a.test/internal">Absolute</a>
        "#;
        assert!(extract_external_links(html, &base_url()).is_empty());
    }

    #[test]
    fn test_different_port_is_external() {
        let html = r#"<a href="http://a.test:8080/y">Other port</a>"#;
        assert_eq!(
            extract_external_links(html, &base_url()),
            vec!["http://a.test:8080/y"]
        );
    }

    #[test]
    fn test_links_are_canonical_and_deduplicated() {
        let html = r#"
            <a href="http://b.test/y?ref=1">One</a>
            <a href="http://b.test/y#top">Two</a>
            <a href="http://c.test/">Three</a>
            <a href="http://b.test/y">Four</a>
        "#;
        assert_eq!(
            extract_external_links(html, &base_url()),
            vec!["http://b.test/y", "http://c.test/"]
        );
    }

    #[test]
    fn test_skip_special_schemes() {
        let html = r##"
            <a href="javascript:void(0)">JS</a>
            <a href="mailto:test@example.com">Mail</a>
            <a href="tel:+1234567890">Call</a>
            <a href="data:text/html,hi">Data</a>
            <a href="ftp://files.test/a">FTP</a>
            <a href="#section">Jump</a>
        "##;
        assert!(extract_external_links(html, &base_url()).is_empty());
    }

    #[test]
    fn test_anchor_without_href_ignored() {
        let html = r#"<a name="top">Top</a><a href="https://d.test/">D</a>"#;
        assert_eq!(
            extract_external_links(html, &base_url()),
            vec!["https://d.test/"]
        );
    }

    #[test]
    fn test_malformed_html_is_lenient() {
        let html = r#"<html><body><a href="http://b.test/y">unclosed <div><p>"#;
        assert_eq!(
            extract_external_links(html, &base_url()),
            vec!["http://b.test/y"]
        );
        assert!(extract_external_links("", &base_url()).is_empty());
    }

    #[test]
    fn test_extract_text_skips_scripts() {
        let html = r#"
            <html>
            <head><title>Cats</title><style>body { color: red; }</style></head>
            <body>
                <p>cat cat</p>
                <script>var dog = 1;</script>
                <div>dog <b>bird</b></div>
                <noscript>enable javascript</noscript>
            </body>
            </html>
        "#;
        assert_eq!(extract_text(html), "Cats cat cat dog bird");
    }

    #[test]
    fn test_extract_text_empty_page() {
        assert_eq!(extract_text("<html><body>   </body></html>"), "");
        assert_eq!(extract_text(""), "");
    }

    #[test]
    fn test_resolve_link() {
        let base = base_url();
        assert_eq!(
            resolve_link("/page", &base).map(|u| u.to_string()),
            Some("http://a.test/page".to_string())
        );
        assert_eq!(
            resolve_link("  https://b.test/  ", &base).map(|u| u.to_string()),
            Some("https://b.test/".to_string())
        );
        assert!(resolve_link("", &base).is_none());
        assert!(resolve_link("JavaScript:alert(1)", &base).is_none());
    }
}
