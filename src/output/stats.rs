//! Run statistics
//!
//! Counters collected page by page while crawling and logged as a summary
//! once the last page is done.

use crate::crawler::PageOutcome;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Page count reported by the catalog
    pub total_pages: u32,

    /// Pages whose batch was handed to the sink
    pub pages_processed: u32,

    /// Pages whose listing could not be fetched or parsed
    pub skipped_pages: Vec<u32>,

    /// Poem links found on processed listing pages
    pub documents_listed: u64,

    /// Poems given up on after exhausting retries
    pub fetch_failures: u64,

    /// Poems fetched but not extractable
    pub extraction_failures: u64,

    /// Rows written during this run
    pub records_written: u64,

    /// Wall time of the run so far
    pub elapsed: Duration,
}

impl CrawlStatistics {
    pub fn new(total_pages: u32) -> Self {
        Self {
            started_at: Utc::now(),
            total_pages,
            pages_processed: 0,
            skipped_pages: Vec::new(),
            documents_listed: 0,
            fetch_failures: 0,
            extraction_failures: 0,
            records_written: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Folds one page's outcome into the totals
    pub fn record_page(&mut self, outcome: &PageOutcome) {
        if outcome.skipped {
            self.skipped_pages.push(outcome.page_index);
        } else {
            self.pages_processed += 1;
        }
        self.documents_listed += outcome.listed as u64;
        self.fetch_failures += outcome.fetch_failures as u64;
        self.extraction_failures += outcome.extraction_failures as u64;
        self.records_written += outcome.records.len() as u64;
    }

    /// Poems that were listed but did not make it into the output
    pub fn documents_dropped(&self) -> u64 {
        self.fetch_failures + self.extraction_failures
    }

    /// Logs the end-of-run summary
    pub fn log_summary(&self) {
        tracing::info!(
            "Run started {} finished after {:.3}s",
            self.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            self.elapsed.as_secs_f64()
        );
        tracing::info!(
            "Pages: {} processed, {} skipped, {} in catalog",
            self.pages_processed,
            self.skipped_pages.len(),
            self.total_pages
        );
        tracing::info!(
            "Poems: {} listed, {} written, {} fetch failures, {} extraction failures",
            self.documents_listed,
            self.records_written,
            self.fetch_failures,
            self.extraction_failures
        );

        if !self.skipped_pages.is_empty() {
            tracing::warn!(
                "Skipped pages were not retried and are missing from the output: {:?}",
                self.skipped_pages
            );
        }
    }
}
