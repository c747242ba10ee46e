//! miobt.com adapter.
//!
//! Listing rows only link to a detail page, so each record costs one extra
//! request. miobt keeps serving its last page for any page number past the
//! end, which is why the search stops when a page repeats.

use super::detail::{listing_url, parse_listing, record_from_detail};
use super::{Adapter, AdapterSettings, PagedSite, RawRow, Termination, search_site};
use crate::error::Result;
use crate::models::{Record, SearchQuery};
use crate::utils::http::Fetch;

const NAME: &str = "Miobt";
const DOMAIN: &str = "https://miobt.com/";
const SEARCH_URL: &str = "https://miobt.com/search.php";
const CONTAINER: &str = "tbody.tbody#data_list";

/// Adapter for miobt.com.
pub struct Miobt {
    settings: AdapterSettings,
}

impl Miobt {
    pub fn new(settings: AdapterSettings) -> Self {
        Self { settings }
    }
}

impl Adapter for Miobt {
    fn name(&self) -> &'static str {
        NAME
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        search_site(self, query)
    }
}

impl PagedSite for Miobt {
    fn site_name(&self) -> &'static str {
        NAME
    }

    fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    fn supports_collection(&self) -> bool {
        true
    }

    fn collected_by_default(&self) -> bool {
        true
    }

    fn termination(&self) -> Termination {
        Termination::RepeatedLeadingTitle
    }

    fn page_url(&self, query: &SearchQuery, collected: bool, page: u32) -> Result<String> {
        listing_url(SEARCH_URL, query, collected, page)
    }

    fn parse_page(&self, html: &str, page: u32) -> Result<Option<Vec<RawRow>>> {
        parse_listing(NAME, html, page, CONTAINER, DOMAIN)
    }

    fn to_record(&self, fetcher: &dyn Fetch, row: RawRow) -> Result<Option<Record>> {
        record_from_detail(NAME, &self.settings, fetcher, row)
    }
}
