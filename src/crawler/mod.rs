//! Crawler module: the extension point and the loop that drives it
//!
//! This module contains:
//! - The `Crawler` trait concrete crawlers implement (`parse` + `scrape`)
//! - The sequential crawl loop with pacing and failure policy
//! - `HtmlCrawler`, a ready-made crawler for ordinary HTML pages

mod html;
mod report;
mod runner;

pub use html::{parse_html, HtmlCrawler, HtmlPage};
pub use report::{CrawlReport, FailedTarget, ScrapedPage};
pub use runner::CrawlLoop;

use crate::session::Session;
use crate::Result;
use async_trait::async_trait;

/// Structured data extracted from one page: field name to value
pub type ScrapeResult = serde_json::Map<String, serde_json::Value>;

/// Page-specific crawling logic
///
/// Both methods are required; the crawl loop calls `parse` then `scrape` for
/// every target, in order.
///
/// # Example
///
/// ```rust,ignore
/// struct TitleCrawler;
///
/// #[async_trait]
/// impl Crawler for TitleCrawler {
///     type Page = String;
///
///     async fn parse(&self, session: &Session, locator: &str) -> Result<String> {
///         // fetch through session.client() ...
///     }
///
///     fn scrape(&self, locator: &str, page: String) -> Result<ScrapeResult> {
///         // pull fields out of the page ...
///     }
/// }
/// ```
#[async_trait]
pub trait Crawler: Send + Sync {
    /// Structural representation of a fetched page
    type Page: Send;

    /// Fetches `locator` through `session` and parses it
    ///
    /// # Errors
    ///
    /// * `VeilError::Fetch` - The page could not be retrieved
    /// * `VeilError::Parse` - The content could not be parsed
    async fn parse(&self, session: &Session, locator: &str) -> Result<Self::Page>;

    /// Extracts a scrape result from a parsed page
    ///
    /// # Errors
    ///
    /// * `VeilError::Extraction` - Expected fields are missing
    fn scrape(&self, locator: &str, page: Self::Page) -> Result<ScrapeResult>;
}
