//! Output module for presenting crawl results
//!
//! Results are written as JSON lines (one scraped page per line) so they can
//! be piped into other tools; the run summary goes to the log.

use crate::crawler::CrawlReport;
use crate::Result;
use std::io::Write;

/// Writes one JSON object per scraped page: `{"index", "locator", "data"}`
///
/// # Arguments
///
/// * `report` - The finished crawl report
/// * `writer` - Destination, typically stdout
pub fn write_json_lines<W: Write>(report: &CrawlReport, mut writer: W) -> Result<()> {
    for page in &report.pages {
        serde_json::to_writer(&mut writer, page)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Logs a human-readable summary of the run
pub fn print_summary(report: &CrawlReport) {
    let succeeded = report.pages.len();
    let failed = report.failures.len();
    let success_rate = if report.targets > 0 {
        (succeeded as f64 / report.targets as f64) * 100.0
    } else {
        0.0
    };

    tracing::info!(
        "Targets: {}, scraped: {}, failed: {} ({:.1}% success)",
        report.targets,
        succeeded,
        failed,
        success_rate
    );

    if let Some(ms) = report.duration_ms() {
        tracing::info!("Duration: {:.1}s", ms as f64 / 1000.0);
    }

    for failure in &report.failures {
        tracing::warn!(
            "  #{} {} [{}]: {}",
            failure.index,
            failure.locator,
            failure.kind,
            failure.message
        );
    }
}
