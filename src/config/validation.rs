use crate::config::types::{Config, CrawlConfig, FetchConfig, MainConfig, SiteProfile};
use crate::ConfigError;
use crate::crawler::compile_selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_main_config(&config.main)?;
    validate_fetch_config(&config.fetch)?;
    validate_crawl_config(&config.crawl)?;
    validate_site_profile(&config.site)?;
    Ok(())
}

/// Validates the catalog URL and output location
fn validate_main_config(config: &MainConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid url '{}': {}", config.url, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Catalog url '{}' must use http or https",
            config.url
        )));
    }

    if config.output_file.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates fetch and retry settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_try < 1 || config.max_try > 100 {
        return Err(ConfigError::Validation(format!(
            "max-try must be between 1 and 100, got {}",
            config.max_try
        )));
    }

    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the page range
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.start_page < 1 {
        return Err(ConfigError::Validation(format!(
            "start-page is 1-based, got {}",
            config.start_page
        )));
    }

    Ok(())
}

/// Checks that every selector in the site profile parses
fn validate_site_profile(site: &SiteProfile) -> Result<(), ConfigError> {
    for (field, selector) in site.selectors() {
        compile_selector(field, selector)?;
    }

    Ok(())
}
