//! Source adapters for torrent index sites.
//!
//! Every site implements [`Adapter`], the search contract the session uses.
//! Sites that list releases page by page also implement [`PagedSite`], which
//! splits the work into pure steps:
//! - `page_url`: query parameters for page *n*
//! - `parse_page`: page markup to [`RawRow`]s (no network)
//! - `to_record`: one row to a [`Record`], or a logged skip
//!
//! [`paginate`] drives those steps until the site runs out of pages.

mod acgrip;
mod comicat;
mod detail;
mod dmhy;
mod miobt;
mod nyaa;
pub mod registry;
mod tokyotosho;

pub use acgrip::Acgrip;
pub use comicat::Comicat;
pub use dmhy::Dmhy;
pub use miobt::Miobt;
pub use nyaa::Nyaa;
pub use registry::{AdapterConstructor, names, resolve};
pub use tokyotosho::Tokyotosho;

use scraper::{ElementRef, Selector};

use crate::error::{AppError, Result};
use crate::models::{HttpConfig, Record, SearchQuery};
use crate::utils::http::{Fetch, FetchOptions, HttpFetcher};
use crate::utils::{normalize_whitespace, time};

/// The search contract every source implements.
pub trait Adapter {
    /// Registered name of the source.
    fn name(&self) -> &'static str;

    /// Run a full search and return every record found, in page order.
    fn search(&self, query: &SearchQuery) -> Result<Vec<Record>>;
}

/// Construction-time options shared by all adapters.
#[derive(Debug, Clone)]
pub struct AdapterSettings {
    /// Output pattern for release times
    pub time_format: String,
    /// Verify TLS certificates
    pub verify_tls: bool,
    /// HTTP client settings
    pub http: HttpConfig,
}

impl Default for AdapterSettings {
    fn default() -> Self {
        Self {
            time_format: "%Y/%m/%d %H:%M".to_string(),
            verify_tls: false,
            http: HttpConfig::default(),
        }
    }
}

/// Fields pulled out of one listing row before conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    pub title: String,
    pub released: Option<String>,
    pub size: Option<String>,
    pub link: Option<String>,
}

/// How a site signals that the last page has been passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// A page without a results container or rows
    EmptyPage,
    /// An empty page, or a page whose first title repeats the previous page's.
    /// Sites that keep serving their last page need this.
    RepeatedLeadingTitle,
}

/// How a site writes its release times.
#[derive(Debug, Clone, Copy)]
pub enum NativeTime {
    Pattern(&'static str),
    UnixSeconds,
}

/// A site whose results are spread over numbered pages.
pub trait PagedSite {
    fn site_name(&self) -> &'static str;

    fn settings(&self) -> &AdapterSettings;

    /// Whether the site has a collection filter.
    fn supports_collection(&self) -> bool {
        false
    }

    /// Collection filter used when the query leaves it unset.
    fn collected_by_default(&self) -> bool {
        false
    }

    fn termination(&self) -> Termination {
        Termination::EmptyPage
    }

    /// Whether a rejected response (error status or non-HTML page) after the
    /// first page ends the search instead of failing it.
    fn stops_on_rejected_page(&self) -> bool {
        false
    }

    /// URL of page `page` (1-based).
    fn page_url(&self, query: &SearchQuery, collected: bool, page: u32) -> Result<String>;

    /// Extract rows from a page. `Ok(None)` means the results container is missing.
    fn parse_page(&self, html: &str, page: u32) -> Result<Option<Vec<RawRow>>>;

    /// Convert a row. `Ok(None)` skips the row; errors abort the search.
    fn to_record(&self, fetcher: &dyn Fetch, row: RawRow) -> Result<Option<Record>>;
}

/// Search a paged site over HTTP using the query's proxy options.
pub fn search_site<S: PagedSite + ?Sized>(site: &S, query: &SearchQuery) -> Result<Vec<Record>> {
    let settings = site.settings();
    let fetcher = HttpFetcher::new(
        &settings.http,
        FetchOptions {
            proxies: query.proxies.clone(),
            system_proxy: query.system_proxy.unwrap_or(false),
            verify_tls: settings.verify_tls,
        },
    );
    paginate(site, &fetcher, query)
}

/// Fetch successive pages until the site's termination condition holds.
pub fn paginate<S: PagedSite + ?Sized>(
    site: &S,
    fetcher: &dyn Fetch,
    query: &SearchQuery,
) -> Result<Vec<Record>> {
    let name = site.site_name();
    let mut collected = query.collected.unwrap_or(site.collected_by_default());
    if collected && !site.supports_collection() {
        log::warn!("{name} does not support collection search, ignoring the filter.");
        collected = false;
    }

    let mut records = Vec::new();
    let mut previous_lead: Option<String> = None;
    let mut page = 1;

    loop {
        log::debug!("Processing page {page} of {name}");

        let url = site.page_url(query, collected, page)?;
        let bytes = match fetcher.fetch(&url) {
            Ok(bytes) => bytes,
            Err(AppError::Rejected { message, .. }) if page > 1 && site.stops_on_rejected_page() => {
                log::debug!("Page {page} of {name} was rejected ({message}), stopping");
                break;
            }
            Err(e) => return Err(e),
        };
        let html = String::from_utf8_lossy(&bytes);

        let Some(rows) = site.parse_page(&html, page)? else {
            log::debug!("No results container on page {page}, stopping");
            break;
        };
        let Some(lead) = rows.first().map(|row| row.title.clone()) else {
            log::debug!("Page {page} has no rows, stopping");
            break;
        };

        // Approximation: a site that reorders same-titled releases across a
        // page boundary can end the search one page early.
        if site.termination() == Termination::RepeatedLeadingTitle
            && previous_lead.as_deref() == Some(lead.as_str())
        {
            log::debug!("Page {page} repeats the previous page, stopping");
            break;
        }
        previous_lead = Some(lead);

        for row in rows {
            if let Some(record) = site.to_record(fetcher, row)? {
                log::debug!("Successfully got: {}", record.title);
                records.push(record);
            }
        }

        page += 1;
    }

    log::info!("{name} search finished with {} results", records.len());
    Ok(records)
}

/// Build a record from a row whose fields are all present.
///
/// Missing fields skip the row. A release time that does not match the
/// site's pattern is an error.
pub(crate) fn build_record(
    site_name: &str,
    settings: &AdapterSettings,
    row: RawRow,
    native: NativeTime,
) -> Result<Option<Record>> {
    let RawRow {
        title,
        released,
        size,
        link,
    } = row;

    let (Some(released), Some(size), Some(link)) = (released, size, link) else {
        return Ok(skip(site_name, &title, "missing time, size or link"));
    };
    if title.is_empty() {
        return Ok(skip(site_name, &title, "empty title"));
    }

    let released_at = match native {
        NativeTime::Pattern(pattern) => time::reformat(&released, pattern, &settings.time_format)?,
        NativeTime::UnixSeconds => time::from_unix(&released, &settings.time_format)?,
    };

    Ok(Some(Record::new(released_at, title, compact_size(&size), link)))
}

/// Log a skipped row.
pub(crate) fn skip(site_name: &str, title: &str, reason: &str) -> Option<Record> {
    log::warn!("{site_name}: skipping row '{title}': {reason}");
    None
}

/// Drop whitespace between a size's value and unit, `1.2 GiB` -> `1.2GiB`.
pub(crate) fn compact_size(size: &str) -> String {
    size.split_whitespace().collect()
}

/// Parse a CSS selector.
pub(crate) fn selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Direct child elements of `parent` with the given tag name.
pub(crate) fn children_named<'a>(parent: ElementRef<'a>, tag: &str) -> Vec<ElementRef<'a>> {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == tag)
        .collect()
}

/// Table cells of a row, failing when the layout has fewer than `expected`.
pub(crate) fn cells<'a>(
    site_name: &str,
    page: u32,
    row: ElementRef<'a>,
    expected: usize,
) -> Result<Vec<ElementRef<'a>>> {
    let tds = children_named(row, "td");
    if tds.len() < expected {
        return Err(AppError::parse(
            site_name,
            page,
            format!("expected {expected} cells in a row, found {}", tds.len()),
        ));
    }
    Ok(tds)
}

/// Whitespace-normalized text content of an element.
pub(crate) fn text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<String>())
}

/// Query parameters shared by every site: the fixed ones, then the caller's extras.
pub(crate) fn with_extras(
    mut params: Vec<(String, String)>,
    query: &SearchQuery,
) -> Vec<(String, String)> {
    params.extend(query.extra.iter().map(|(k, v)| (k.clone(), v.clone())));
    params
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    /// Serves canned pages keyed by a URL substring and records each request.
    ///
    /// URLs matching a rejected part answer like a `404`; URLs matching
    /// nothing fail like an unreachable host.
    #[derive(Default)]
    pub struct StubFetcher {
        pages: Vec<(String, String)>,
        rejected: Vec<String>,
        pub requests: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        pub fn page(mut self, url_part: &str, html: &str) -> Self {
            self.pages.push((url_part.to_string(), html.to_string()));
            self
        }

        pub fn reject(mut self, url_part: &str) -> Self {
            self.rejected.push(url_part.to_string());
            self
        }
    }

    impl Fetch for StubFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.requests.borrow_mut().push(url.to_string());
            if self.rejected.iter().any(|part| url.contains(part.as_str())) {
                return Err(AppError::rejected(url, "unexpected response 404 Not Found"));
            }
            self.pages
                .iter()
                .find(|(part, _)| url.contains(part.as_str()))
                .map(|(_, html)| html.clone().into_bytes())
                .ok_or_else(|| AppError::request(url, "no stub page"))
        }
    }
}
