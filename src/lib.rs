//! Poesy Loader: a paginated poem catalog crawler
//!
//! This crate walks every listing page of a poem catalog, fetches the poems
//! each page links to, extracts author, title and text, and appends the
//! results page by page to a CSV file that survives restarts.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Poesy Loader operations
///
/// Only errors that abort the whole run surface here. Per-page and
/// per-document failures are absorbed by the crawler and logged.
#[derive(Debug, Error)]
pub enum PoesyError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog unavailable at {url}: {reason}")]
    CatalogUnavailable { url: String, reason: String },

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}' for {field}")]
    InvalidSelector { field: &'static str, selector: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Cannot resolve link '{href}' against '{base}'")]
    Unresolvable { href: String, base: String },
}

/// Result type alias for Poesy Loader operations
pub type Result<T> = std::result::Result<T, PoesyError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::Record;
pub use output::{CrawlStatistics, CsvSink, OutputCursor, RecordSink};
pub use crate::url::{document_base, listing_address, resolve_document_link};
