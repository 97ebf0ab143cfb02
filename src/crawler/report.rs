//! Crawl run results

use crate::crawler::ScrapeResult;
use crate::VeilError;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A successfully scraped target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScrapedPage {
    /// Position of the target in the target list
    pub index: usize,

    pub locator: String,

    #[serde(rename = "data")]
    pub result: ScrapeResult,
}

/// A target that failed under the skip policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTarget {
    pub index: usize,

    pub locator: String,

    /// Error category (`fetch`, `parse`, `extraction`, ...)
    pub kind: String,

    pub message: String,
}

/// Outcome of a crawl run
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Number of targets the run was given
    pub targets: usize,

    /// Scraped pages in target order
    pub pages: Vec<ScrapedPage>,

    /// Targets skipped after a failure, in target order
    pub failures: Vec<FailedTarget>,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,
}

impl CrawlReport {
    pub(crate) fn new(targets: usize) -> Self {
        Self {
            targets,
            pages: Vec::with_capacity(targets),
            failures: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub(crate) fn record_page(&mut self, index: usize, locator: &str, result: ScrapeResult) {
        self.pages.push(ScrapedPage {
            index,
            locator: locator.to_string(),
            result,
        });
    }

    pub(crate) fn record_failure(&mut self, index: usize, locator: &str, error: &VeilError) {
        self.failures.push(FailedTarget {
            index,
            locator: locator.to_string(),
            kind: error.kind().to_string(),
            message: error.to_string(),
        });
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    /// Whether every target produced a result
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.pages.len() == self.targets
    }

    /// Run duration in milliseconds, once finished
    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }

    /// Consumes the report, keeping only the scrape results
    pub fn into_results(self) -> Vec<ScrapeResult> {
        self.pages.into_iter().map(|p| p.result).collect()
    }
}
