use serde::Deserialize;

/// Main configuration structure for Poesy Loader
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub main: MainConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub site: SiteProfile,
}

/// The two required inputs: where the catalog starts and where rows go
#[derive(Debug, Clone, Deserialize)]
pub struct MainConfig {
    /// Catalog entry point (listing page 1)
    pub url: String,

    /// Path to the CSV output file
    pub output_file: String,
}

/// HTTP fetch and retry behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Maximum attempts per address before giving up
    #[serde(rename = "max-try")]
    pub max_try: u32,

    /// Base backoff unit; attempt `n` waits `n` units (milliseconds)
    #[serde(rename = "backoff-unit-ms")]
    pub backoff_unit_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum number of document fetches in flight per page
    pub concurrency: usize,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_try: 15,
            backoff_unit_ms: 1000,
            timeout_secs: 30,
            concurrency: 8,
            user_agent: format!("poesy-loader/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Page range control
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// First listing page to process (1-based)
    #[serde(rename = "start-page")]
    pub start_page: u32,

    /// Stop after this many pages; 0 means no limit
    #[serde(rename = "max-pages")]
    pub max_pages: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_page: 1,
            max_pages: 0,
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Optional file the log stream is also appended to
    pub file: Option<String>,
}

/// Site-specific markup and link layout of the catalog
///
/// The defaults describe the catalog this tool was written for. Another
/// catalog with the same shape only needs a different `[site]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SiteProfile {
    /// Trailing `/`-separated components removed from the catalog URL to
    /// form the base that detail links are appended to
    pub strip_segments: usize,

    pub listing_container: String,
    pub listing_item: String,
    pub item_link: String,
    pub pagination: String,
    pub pagination_entry: String,

    pub document_root: String,
    pub author: String,
    pub title: String,
    pub stanza_container: String,
    pub stanza: String,
    pub metadata: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            strip_segments: 3,
            listing_container: "div._2VELq".to_string(),
            listing_item: "div._1jGw_".to_string(),
            item_link: "a._2A3Np".to_string(),
            pagination: "div._2uPBE".to_string(),
            pagination_entry: "a.GmJ5E".to_string(),
            document_root: "div._1MTBU._3RpDE._47J4f._3IEeu".to_string(),
            author: "div._14JnI".to_string(),
            title: "div._2jzeL".to_string(),
            stanza_container: "div._3P9bi".to_string(),
            stanza: "p".to_string(),
            metadata: "div".to_string(),
        }
    }
}

impl SiteProfile {
    /// All selectors paired with their config field names
    pub fn selectors(&self) -> [(&'static str, &str); 11] {
        [
            ("listing-container", self.listing_container.as_str()),
            ("listing-item", self.listing_item.as_str()),
            ("item-link", self.item_link.as_str()),
            ("pagination", self.pagination.as_str()),
            ("pagination-entry", self.pagination_entry.as_str()),
            ("document-root", self.document_root.as_str()),
            ("author", self.author.as_str()),
            ("title", self.title.as_str()),
            ("stanza-container", self.stanza_container.as_str()),
            ("stanza", self.stanza.as_str()),
            ("metadata", self.metadata.as_str()),
        ]
    }
}
