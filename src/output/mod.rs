//! Output module for persisting extracted poems
//!
//! This module handles:
//! - The record sink interface and its row cursor
//! - The CSV file sink
//! - Crawl statistics

mod csv_sink;
pub mod stats;
mod traits;

pub use csv_sink::CsvSink;
pub use stats::CrawlStatistics;
pub use traits::{OutputCursor, OutputError, OutputResult, RecordSink};
