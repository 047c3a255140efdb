//! URL handling module for Poesy Loader
//!
//! Listing pages and poem pages are addressed relative to the single catalog
//! URL from the configuration:
//!
//! - listing page 1 is the catalog URL itself, later pages add `?page=N`
//! - detail links on listing pages are site-relative and are appended to a
//!   base formed by cutting a fixed number of trailing path components off
//!   the catalog URL

use crate::{UrlError, UrlResult};
use url::Url;

/// Query parameter carrying the listing page number
pub const PAGE_PARAM: &str = "page";

/// Returns the address of a 1-based listing page
///
/// # Examples
///
/// ```
/// use poesy_loader::url::listing_address;
/// use url::Url;
///
/// let catalog = Url::parse("https://example.com/poems/top/all").unwrap();
/// assert_eq!(listing_address(&catalog, 1).as_str(), "https://example.com/poems/top/all");
/// assert_eq!(
///     listing_address(&catalog, 4).as_str(),
///     "https://example.com/poems/top/all?page=4"
/// );
/// ```
pub fn listing_address(catalog: &Url, page_index: u32) -> Url {
    let mut url = catalog.clone();
    if page_index > 1 {
        url.query_pairs_mut()
            .append_pair(PAGE_PARAM, &page_index.to_string());
    }
    url
}

/// Builds the base that relative detail links are appended to
///
/// The catalog URL is split on `/` and the last `strip_segments` pieces are
/// dropped, so `https://host/poems/top/all` with 3 stripped becomes
/// `https://host`.
///
/// # Errors
///
/// Returns `UrlError::Parse` if stripping leaves something that is no longer
/// an absolute URL with a host.
pub fn document_base(catalog: &str, strip_segments: usize) -> UrlResult<String> {
    let parts: Vec<&str> = catalog.split('/').collect();
    let keep = parts.len().saturating_sub(strip_segments);
    let base = parts[..keep].join("/");

    match Url::parse(&base) {
        Ok(url) if url.host_str().is_some() => Ok(base),
        _ => Err(UrlError::Parse(format!(
            "stripping {} segments from '{}' leaves '{}'",
            strip_segments, catalog, base
        ))),
    }
}

/// Resolves a detail link found on a listing page to an absolute URL
///
/// Absolute http(s) links are returned unchanged; anything else is appended
/// to `base`.
pub fn resolve_document_link(base: &str, href: &str) -> UrlResult<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return Err(UrlError::Unresolvable {
            href: href.to_string(),
            base: base.to_string(),
        });
    }

    if let Ok(absolute) = Url::parse(href) {
        return match absolute.scheme() {
            "http" | "https" => Ok(absolute),
            other => Err(UrlError::InvalidScheme(other.to_string())),
        };
    }

    let joined = if href.starts_with('/') {
        format!("{}{}", base.trim_end_matches('/'), href)
    } else {
        format!("{}/{}", base.trim_end_matches('/'), href)
    };

    Url::parse(&joined).map_err(|e| UrlError::Parse(format!("{}: {}", joined, e)))
}
