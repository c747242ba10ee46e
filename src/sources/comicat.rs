//! comicat.org adapter. Same listing layout and detail-page magnets as miobt.

use super::detail::{listing_url, parse_listing, record_from_detail};
use super::{Adapter, AdapterSettings, PagedSite, RawRow, Termination, search_site};
use crate::error::Result;
use crate::models::{Record, SearchQuery};
use crate::utils::http::Fetch;

const NAME: &str = "Comicat";
const DOMAIN: &str = "https://comicat.org/";
const SEARCH_URL: &str = "https://comicat.org/search.php";
const CONTAINER: &str = "#data_list";

/// Adapter for comicat.org.
pub struct Comicat {
    settings: AdapterSettings,
}

impl Comicat {
    pub fn new(settings: AdapterSettings) -> Self {
        Self { settings }
    }
}

impl Adapter for Comicat {
    fn name(&self) -> &'static str {
        NAME
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        search_site(self, query)
    }
}

impl PagedSite for Comicat {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::detail::fixtures::{detail_page, listing};
    use crate::sources::paginate;
    use crate::sources::testing::StubFetcher;

    #[test]
    fn test_page_url() {
        let comicat = Comicat::new(AdapterSettings::default());
        let url = comicat
            .page_url(&SearchQuery::new("Frieren").extra("team_id", "3"), true, 1)
            .unwrap();
        assert_eq!(
            url,
            "https://comicat.org/search.php?keyword=Frieren&complete=1&team_id=3&page=1"
        );
    }

    #[test]
    fn test_search_across_pages() {
        let fetcher = StubFetcher::default()
            .page("page=1", &listing(r#"id="data_list""#, "First"))
            .page("page=2", &listing(r#"id="data_list""#, "Third"))
            .page("page=3", "<html><body>无结果</body></html>")
            .page("show-", &detail_page());

        let records = paginate(
            &Comicat::new(AdapterSettings::default()),
            &fetcher,
            &SearchQuery::new("x"),
        )
        .unwrap();

        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third", "Second"]);
        assert!(records.iter().all(|r| r.link.starts_with("magnet:?xt=urn:btih:")));
        assert!(fetcher.requests.borrow()[1].starts_with("https://comicat.org/show-1"));
    }
}
