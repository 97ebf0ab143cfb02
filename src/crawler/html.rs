//! Reference crawler for ordinary HTML pages
//!
//! `HtmlCrawler` fetches a page through the session, parses it with
//! `scraper`, and extracts:
//! - The page title (required)
//! - The meta description (optional)
//! - Outgoing links, resolved to absolute http(s) URLs

use crate::crawler::{Crawler, ScrapeResult};
use crate::session::Session;
use crate::{Result, VeilError};
use async_trait::async_trait;
use scraper::{Html, Selector};
use serde_json::{json, Value};
use url::Url;

/// Extracted information from an HTML page
#[derive(Debug, Clone, PartialEq)]
pub struct HtmlPage {
    /// Final URL after redirects
    pub url: String,

    /// The page title (from <title> tag)
    pub title: Option<String>,

    /// `<meta name="description">` content
    pub description: Option<String>,

    /// All links found on the page (absolute URLs)
    pub links: Vec<String>,
}

/// Crawler that extracts title, description and links from HTML pages
#[derive(Debug, Clone, Default)]
pub struct HtmlCrawler;

impl HtmlCrawler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Crawler for HtmlCrawler {
    type Page = HtmlPage;

    async fn parse(&self, session: &Session, locator: &str) -> Result<HtmlPage> {
        let fetch_error = |message: String| VeilError::Fetch {
            url: locator.to_string(),
            message,
        };
        let parse_error = |message: String| VeilError::Parse {
            url: locator.to_string(),
            message,
        };

        let response = session
            .client()
            .get(locator)
            .send()
            .await
            .map_err(|e| fetch_error(describe_request_error(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status)));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if !is_html_content_type(&content_type) {
            return Err(parse_error(format!(
                "expected HTML, got '{}'",
                content_type
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| fetch_error(describe_request_error(&e)))?;

        if body.trim().is_empty() {
            return Err(parse_error("empty document".to_string()));
        }

        tracing::debug!("Fetched {} ({} bytes)", final_url, body.len());
        Ok(parse_html(&body, &final_url))
    }

    fn scrape(&self, locator: &str, page: HtmlPage) -> Result<ScrapeResult> {
        let title = page.title.ok_or_else(|| VeilError::Extraction {
            url: locator.to_string(),
            message: "page has no <title>".to_string(),
        })?;

        let mut result = ScrapeResult::new();
        result.insert("url".to_string(), Value::String(page.url));
        result.insert("title".to_string(), Value::String(title));
        result.insert(
            "description".to_string(),
            page.description.map_or(Value::Null, Value::String),
        );
        result.insert("links".to_string(), json!(page.links));
        Ok(result)
    }
}

/// Media types are case-insensitive, so `Text/HTML` counts as HTML too
fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}

/// Classifies a reqwest error the way it is reported in crawl logs
fn describe_request_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}

/// Parses HTML content and extracts title, description and links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs and fragment-only links
///
/// # Example
///
/// ```no_run
/// use veilcrawl::crawler::parse_html;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let parsed = parse_html(html, &base_url);
/// assert_eq!(parsed.title, Some("Test".to_string()));
/// ```
pub fn parse_html(html: &str, base_url: &Url) -> HtmlPage {
    let document = Html::parse_document(html);

    HtmlPage {
        url: base_url.to_string(),
        title: extract_title(&document),
        description: extract_description(&document),
        links: extract_links(&document, base_url),
    }
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn extract_description(document: &Html) -> Option<String> {
    let selector = Selector::parse("meta[name='description'][content]").ok()?;

    document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts all valid links from the HTML document, in document order
fn extract_links(document: &Html, base_url: &Url) -> Vec<String> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if element.value().attr("download").is_some() {
                continue;
            }

            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    if let Ok(canonical_selector) = Selector::parse("link[rel='canonical'][href]") {
        for element in document.select(&canonical_selector) {
            if let Some(absolute_url) = element
                .value()
                .attr("href")
                .and_then(|href| resolve_link(href, base_url))
            {
                links.push(absolute_url);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL
///
/// Returns None for special schemes, data URIs, fragment-only anchors,
/// unparseable hrefs and anything that is not http(s) after resolution.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| href.starts_with(scheme))
    {
        return None;
    }

    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url.to_string()),
        _ => None,
    }
}
