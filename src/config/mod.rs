//! Configuration module for Poesy Loader
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use poesy_loader::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("poesy_loader.toml")).unwrap();
//! println!("Crawling catalog at: {}", config.main.url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlConfig, FetchConfig, LoggingConfig, MainConfig, SiteProfile};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
