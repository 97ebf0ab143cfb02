//! Sequential crawl loop
//!
//! The loop visits targets strictly one at a time, in list order:
//!
//! 1. Rebuild the session if the rotation interval was reached
//! 2. `parse` the target through the current session
//! 3. `scrape` the parsed page
//! 4. Record the result (or the failure, under the skip policy)
//! 5. Sleep for the configured delay
//!
//! The only suspension points are I/O and the delay, so no request is ever
//! in flight while the identity is being renewed.

use crate::config::{CrawlerConfig, FailurePolicy};
use crate::crawler::{CrawlReport, Crawler, ScrapeResult};
use crate::session::{Session, SessionProvisioner};
use crate::Result;
use std::time::Duration;

/// Drives a [`Crawler`] over a fixed list of targets
pub struct CrawlLoop {
    targets: Vec<String>,
    settings: CrawlerConfig,
    provisioner: SessionProvisioner,
}

impl CrawlLoop {
    /// Creates a crawl loop
    ///
    /// # Arguments
    ///
    /// * `targets` - Locators to visit, in order
    /// * `settings` - Delay, failure policy and rotation settings
    /// * `provisioner` - Source of anonymized sessions
    pub fn new(
        targets: Vec<String>,
        settings: CrawlerConfig,
        provisioner: SessionProvisioner,
    ) -> Self {
        Self {
            targets,
            settings,
            provisioner,
        }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn settings(&self) -> &CrawlerConfig {
        &self.settings
    }

    fn delay(&self) -> Duration {
        Duration::from_secs(self.settings.delay_seconds)
    }

    /// Runs the crawl
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Every target was processed; under the abort
    ///   policy the report holds exactly one page per target, in order
    /// * `Err(VeilError)` - Session creation failed, or a target failed under
    ///   the abort policy; results gathered so far are discarded
    pub async fn crawl<C: Crawler>(&self, crawler: &C) -> Result<CrawlReport> {
        let total = self.targets.len();
        let mut report = CrawlReport::new(total);

        if total == 0 {
            tracing::info!("No targets to crawl");
            return Ok(report.finish());
        }

        tracing::info!(
            "Starting crawl of {} targets ({}s delay, on failure: {:?})",
            total,
            self.settings.delay_seconds,
            self.settings.on_failure
        );

        let mut session = self.provisioner.create_session().await?;
        let mut visited_with_session: u32 = 0;

        for (index, locator) in self.targets.iter().enumerate() {
            if let Some(every) = self.settings.rotate_every {
                if visited_with_session >= every {
                    tracing::info!("Rotating identity after {} targets", visited_with_session);
                    session = self.provisioner.create_session().await?;
                    visited_with_session = 0;
                }
            }

            tracing::debug!("Processing target {}/{}: {}", index + 1, total, locator);

            match visit(crawler, &session, locator).await {
                Ok(result) => report.record_page(index, locator, result),
                Err(e) => match self.settings.on_failure {
                    FailurePolicy::Abort => {
                        tracing::error!("Aborting crawl at {}: {}", locator, e);
                        return Err(e);
                    }
                    FailurePolicy::Skip => {
                        tracing::warn!("Skipping {}: {}", locator, e);
                        report.record_failure(index, locator, &e);
                    }
                },
            }
            visited_with_session += 1;

            let is_last = index + 1 == total;
            if !is_last || self.settings.delay_after_last {
                tokio::time::sleep(self.delay()).await;
            }
        }

        let report = report.finish();
        tracing::info!(
            "Crawl completed: {} scraped, {} failed",
            report.pages.len(),
            report.failures.len()
        );

        Ok(report)
    }
}

/// Parses then scrapes a single target
async fn visit<C: Crawler>(
    crawler: &C,
    session: &Session,
    locator: &str,
) -> Result<ScrapeResult> {
    let page = crawler.parse(session, locator).await?;
    crawler.scrape(locator, page)
}
