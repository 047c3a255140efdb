//! Crawler module for catalog traversal and poem extraction
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with bounded retry and linear backoff
//! - Listing page parsing (poem links and page count)
//! - Poem page extraction
//! - Page-by-page crawl coordination

mod coordinator;
mod extractor;
mod fetcher;
mod listing;

pub use coordinator::{run_crawl, Coordinator, PageOutcome};
pub use extractor::{ExtractionError, Extractor, Record, PARAGRAPH_SEPARATOR};
pub use fetcher::{build_http_client, FetchAttempt, FetchResult, Fetcher, RetryPolicy};
pub use listing::{Lister, ListingError};

use crate::ConfigError;
use scraper::Selector;

/// Parses a CSS selector from the site profile
pub(crate) fn compile_selector(field: &'static str, css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|_| ConfigError::InvalidSelector {
        field,
        selector: css.to_string(),
    })
}
