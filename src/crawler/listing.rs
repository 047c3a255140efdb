//! Listing page parsing
//!
//! A listing page holds an ordered list of poem cards, each with a link to the
//! poem's own page, and a pagination row whose last entry is the number of the
//! last page.

use crate::config::SiteProfile;
use crate::crawler::compile_selector;
use crate::url::{document_base, listing_address, resolve_document_link};
use crate::PoesyError;
use scraper::{Html, Selector};
use thiserror::Error;
use url::Url;

/// A listing page did not have the expected structure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("listing container not found")]
    MissingContainer,
}

/// Address derivation and parsing for catalog listing pages
#[derive(Debug, Clone)]
pub struct Lister {
    catalog: Url,
    base: String,
    container: Selector,
    item: Selector,
    link: Selector,
    pagination: Selector,
    pagination_entry: Selector,
}

impl Lister {
    /// Creates a lister for the given catalog URL and site profile
    pub fn new(catalog: Url, site: &SiteProfile) -> Result<Self, PoesyError> {
        let base = document_base(catalog.as_str(), site.strip_segments)?;

        Ok(Self {
            catalog,
            base,
            container: compile_selector("listing-container", &site.listing_container)?,
            item: compile_selector("listing-item", &site.listing_item)?,
            link: compile_selector("item-link", &site.item_link)?,
            pagination: compile_selector("pagination", &site.pagination)?,
            pagination_entry: compile_selector("pagination-entry", &site.pagination_entry)?,
        })
    }

    /// Base that relative poem links are appended to
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Address of the 1-based listing page
    pub fn listing_address(&self, page_index: u32) -> Url {
        listing_address(&self.catalog, page_index)
    }

    /// Poem page addresses on a listing page, in listing order
    ///
    /// Cards without a usable link are skipped.
    pub fn document_addresses(&self, listing_html: &str) -> Result<Vec<Url>, ListingError> {
        let document = Html::parse_document(listing_html);

        let container = document
            .select(&self.container)
            .next()
            .ok_or(ListingError::MissingContainer)?;

        let mut addresses = Vec::new();
        for (position, item) in container.select(&self.item).enumerate() {
            let Some(href) = item
                .select(&self.link)
                .next()
                .and_then(|a| a.value().attr("href"))
            else {
                tracing::debug!("Listing item {} has no poem link", position + 1);
                continue;
            };

            match resolve_document_link(&self.base, href) {
                Ok(url) => addresses.push(url),
                Err(e) => tracing::debug!("Skipping listing item {}: {}", position + 1, e),
            }
        }

        Ok(addresses)
    }

    /// Number of listing pages, read from the last pagination entry
    ///
    /// # Errors
    ///
    /// `PoesyError::CatalogUnavailable` if the pagination row or its entries
    /// are missing, or the last entry is not a positive number.
    pub fn total_pages(&self, first_listing_html: &str) -> Result<u32, PoesyError> {
        let document = Html::parse_document(first_listing_html);
        let unavailable = |reason: String| PoesyError::CatalogUnavailable {
            url: self.catalog.to_string(),
            reason,
        };

        let pagination = document
            .select(&self.pagination)
            .next()
            .ok_or_else(|| unavailable("pagination control not found".to_string()))?;

        let last = pagination
            .select(&self.pagination_entry)
            .last()
            .ok_or_else(|| unavailable("pagination control has no entries".to_string()))?;

        let text = last.text().collect::<String>();
        match text.trim().parse::<u32>() {
            Ok(count) if count >= 1 => Ok(count),
            _ => Err(unavailable(format!(
                "last pagination entry '{}' is not a page count",
                text.trim()
            ))),
        }
    }
}
