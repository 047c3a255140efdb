//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Discovering the catalog's page count
//! - Fetching each listing page and the poems it links to
//! - Restoring listing order after concurrent fetches
//! - Handing each page's batch to the sink before the next page starts

use crate::config::{Config, CrawlConfig};
use crate::crawler::extractor::{Extractor, Record};
use crate::crawler::fetcher::{build_http_client, FetchAttempt, FetchResult, Fetcher, RetryPolicy};
use crate::crawler::listing::Lister;
use crate::output::{CrawlStatistics, CsvSink, RecordSink};
use crate::PoesyError;
use futures::{stream, StreamExt};
use std::time::Instant;
use url::Url;

/// What came out of one listing page
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    /// 1-based listing page number
    pub page_index: u32,

    /// Extracted poems in listing order
    pub records: Vec<Record>,

    /// Poem links found on the listing page
    pub listed: usize,

    /// Poems whose fetch exhausted its retries
    pub fetch_failures: usize,

    /// Poems fetched but not extractable
    pub extraction_failures: usize,

    /// The listing page itself could not be fetched or parsed
    pub skipped: bool,
}

impl PageOutcome {
    fn skipped(page_index: u32) -> Self {
        Self {
            page_index,
            skipped: true,
            ..Self::default()
        }
    }
}

/// Per-poem result before the page batch is assembled
#[derive(Debug)]
enum DocumentOutcome {
    Extracted(Record),
    FetchFailed,
    ExtractionFailed,
}

/// Main crawler coordinator structure
#[derive(Debug, Clone)]
pub struct Coordinator {
    fetcher: Fetcher,
    lister: Lister,
    extractor: Extractor,
    concurrency: usize,
    crawl: CrawlConfig,
}

impl Coordinator {
    /// Creates a coordinator from the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - HTTP client built and selectors compiled
    /// * `Err(PoesyError)` - Bad catalog URL, selector, or client setup
    pub fn new(config: &Config) -> Result<Self, PoesyError> {
        let catalog = Url::parse(&config.main.url)?;
        let client = build_http_client(&config.fetch)?;

        Ok(Self {
            fetcher: Fetcher::new(client, RetryPolicy::from(&config.fetch)),
            lister: Lister::new(catalog, &config.site)?,
            extractor: Extractor::new(&config.site)?,
            concurrency: config.fetch.concurrency.max(1),
            crawl: config.crawl.clone(),
        })
    }

    /// Reads the page count off the first listing page
    ///
    /// This is a single request with no retries; any failure means the
    /// catalog cannot be crawled at all.
    pub async fn discover_total_pages(&self) -> Result<u32, PoesyError> {
        let url = self.lister.listing_address(1);
        tracing::info!("Get url: {}", url);

        match self.fetcher.attempt(&url).await {
            FetchAttempt::Success(body) => self.lister.total_pages(&body),
            FetchAttempt::Transient(reason) => Err(PoesyError::CatalogUnavailable {
                url: url.to_string(),
                reason,
            }),
        }
    }

    /// Fetches one listing page and every poem on it
    ///
    /// Poems are fetched concurrently, at most `concurrency` at a time, each
    /// with its own retries. Failed poems are left out; the rest come back in
    /// listing order. A listing page that cannot be fetched or parsed yields a
    /// skipped, empty outcome.
    pub async fn process_page(&self, page_index: u32) -> PageOutcome {
        let listing_url = self.lister.listing_address(page_index);
        tracing::info!("Get page {} ({})", page_index, listing_url);

        let listing_html = match self.fetcher.fetch(&listing_url).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::Exhausted {
                attempts,
                last_error,
                ..
            } => {
                tracing::error!(
                    "Page {} skipped, listing fetch failed after {} attempts: {}",
                    page_index,
                    attempts,
                    last_error
                );
                return PageOutcome::skipped(page_index);
            }
        };

        tracing::info!("Parse page {}", page_index);
        let addresses = match self.lister.document_addresses(&listing_html) {
            Ok(addresses) => addresses,
            Err(e) => {
                tracing::error!("Page {} skipped: {}", page_index, e);
                return PageOutcome::skipped(page_index);
            }
        };
        tracing::info!("Page {} lists {} poems", page_index, addresses.len());

        let listed = addresses.len();
        let mut results: Vec<(usize, DocumentOutcome)> = stream::iter(addresses.into_iter().enumerate())
            .map(|(position, url)| async move {
                let outcome = self.process_document(position + 1, &url).await;
                (position, outcome)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        // completions arrive in any order
        results.sort_by_key(|(position, _)| *position);

        let mut outcome = PageOutcome {
            page_index,
            listed,
            ..PageOutcome::default()
        };
        for (_, document) in results {
            match document {
                DocumentOutcome::Extracted(record) => outcome.records.push(record),
                DocumentOutcome::FetchFailed => outcome.fetch_failures += 1,
                DocumentOutcome::ExtractionFailed => outcome.extraction_failures += 1,
            }
        }
        outcome
    }

    /// Fetches and extracts a single poem
    async fn process_document(&self, number: usize, url: &Url) -> DocumentOutcome {
        tracing::info!("Get poem {} ({})", number, url);

        let body = match self.fetcher.fetch(url).await {
            FetchResult::Success { body, .. } => body,
            FetchResult::Exhausted { attempts, .. } => {
                tracing::warn!(
                    "Poem {} dropped, fetch of {} failed after {} attempts",
                    number,
                    url,
                    attempts
                );
                return DocumentOutcome::FetchFailed;
            }
        };

        tracing::debug!("Parse poem {}", number);
        match self.extractor.extract(&body) {
            Ok(record) => {
                tracing::info!("Complete poem {}: {} - {}", number, record.author, record.title);
                DocumentOutcome::Extracted(record)
            }
            Err(e) => {
                tracing::warn!("Poem {} dropped, extraction of {} failed: {}", number, url, e);
                DocumentOutcome::ExtractionFailed
            }
        }
    }

    /// Runs the main crawl loop against a sink
    ///
    /// Discovers the page count, then for each page in range processes it and
    /// appends its batch to `sink`. A page's batch is durable before the next
    /// page is requested.
    ///
    /// # Errors
    ///
    /// * `PoesyError::CatalogUnavailable` - page count discovery failed; the
    ///   sink has not been written to
    /// * `PoesyError::Output` - a batch could not be persisted
    pub async fn run<S: RecordSink>(&self, sink: &mut S) -> Result<CrawlStatistics, PoesyError> {
        tracing::info!("PoesyLoader start");
        let run_start = Instant::now();

        let total_pages = self.discover_total_pages().await?;
        tracing::info!("Page count = {}", total_pages);

        let mut stats = CrawlStatistics::new(total_pages);
        let (first, last) = self.page_range(total_pages);
        if first > last {
            tracing::warn!(
                "start-page {} is past the last page {}, nothing to do",
                first,
                total_pages
            );
        }

        for page_index in first..=last {
            let page_start = Instant::now();

            let outcome = self.process_page(page_index).await;
            sink.append(&outcome.records)?;
            stats.record_page(&outcome);

            tracing::info!(
                "Page {} done. Time: {:.3} sec",
                page_index,
                page_start.elapsed().as_secs_f64()
            );
            tracing::info!(
                "{} poems have been written into the file (next row {})",
                stats.records_written,
                sink.cursor().next_row()
            );
        }

        stats.elapsed = run_start.elapsed();
        tracing::info!("PoesyLoader finish");
        Ok(stats)
    }

    /// Inclusive page range to process given the catalog size
    fn page_range(&self, total_pages: u32) -> (u32, u32) {
        let first = self.crawl.start_page.max(1);
        let last = if self.crawl.max_pages == 0 {
            total_pages
        } else {
            total_pages.min(first.saturating_add(self.crawl.max_pages - 1))
        };
        (first, last)
    }
}

/// Runs the main crawl operation
///
/// Builds the coordinator, opens the CSV output named in the configuration
/// and crawls every page into it.
///
/// # Example
///
/// ```no_run
/// use poesy_loader::config::load_config;
/// use poesy_loader::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("poesy_loader.toml"))?;
/// let stats = run_crawl(config).await?;
/// stats.log_summary();
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config) -> crate::Result<CrawlStatistics> {
    let coordinator = Coordinator::new(&config)?;
    let mut sink = CsvSink::open(&config.main.output_file)?;
    coordinator.run(&mut sink).await
}
