//! nyaa.si adapter.

use scraper::Html;
use url::Url;

use super::{
    Adapter, AdapterSettings, NativeTime, PagedSite, RawRow, build_record, children_named,
    search_site, selector, skip, text, with_extras,
};
use crate::error::Result;
use crate::models::{Record, SearchQuery};
use crate::utils::http::Fetch;

const NAME: &str = "Nyaa";
const BASE_URL: &str = "https://nyaa.si/";
/// Anime, all subcategories
const CATEGORY: &str = "1_0";
const NATIVE_TIME: &str = "%Y-%m-%d %H:%M";

const CONTAINER: &str = "tbody";
const MIN_CELLS: usize = 5;
const TITLE_ANCHOR: &str = "a:not(.comments)";
const TITLE_CELL: usize = 1;
const LINKS_CELL: usize = 2;
const SIZE_CELL: usize = 3;
const TIME_CELL: usize = 4;

/// Adapter for nyaa.si.
pub struct Nyaa {
    settings: AdapterSettings,
}

impl Nyaa {
    pub fn new(settings: AdapterSettings) -> Self {
        Self { settings }
    }
}

impl Adapter for Nyaa {
    fn name(&self) -> &'static str {
        NAME
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        search_site(self, query)
    }
}

impl PagedSite for Nyaa {
    fn site_name(&self) -> &'static str {
        NAME
    }

    fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    /// Pages past the last one are not served as an empty listing.
    fn stops_on_rejected_page(&self) -> bool {
        true
    }

    fn page_url(&self, query: &SearchQuery, _collected: bool, page: u32) -> Result<String> {
        let params = vec![
            ("q".to_string(), query.keyword.clone()),
            ("c".to_string(), CATEGORY.to_string()),
            ("p".to_string(), page.to_string()),
        ];
        Ok(Url::parse_with_params(BASE_URL, with_extras(params, query))?.to_string())
    }

    fn parse_page(&self, html: &str, _page: u32) -> Result<Option<Vec<RawRow>>> {
        let document = Html::parse_document(html);
        let Some(tbody) = document.select(&selector(CONTAINER)?).next() else {
            return Ok(None);
        };

        let title_anchor = selector(TITLE_ANCHOR)?;
        let anchor = selector("a")?;

        let mut rows = Vec::new();
        for tr in children_named(tbody, "tr") {
            let tds = children_named(tr, "td");
            if tds.len() < MIN_CELLS {
                skip(NAME, &text(tr), "too few cells");
                continue;
            }

            let title = tds[TITLE_CELL]
                .select(&title_anchor)
                .last()
                .map(|a| {
                    a.value()
                        .attr("title")
                        .map(str::to_string)
                        .unwrap_or_else(|| text(a))
                })
                .unwrap_or_default();
            // The second link in the cell is the magnet; the first is the .torrent file.
            let link = tds[LINKS_CELL]
                .select(&anchor)
                .nth(1)
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);
            let size = Some(text(tds[SIZE_CELL])).filter(|s| !s.is_empty());
            let released = Some(text(tds[TIME_CELL])).filter(|s| !s.is_empty());

            rows.push(RawRow {
                title,
                released,
                size,
                link,
            });
        }
        Ok(Some(rows))
    }

    fn to_record(&self, _fetcher: &dyn Fetch, row: RawRow) -> Result<Option<Record>> {
        build_record(NAME, &self.settings, row, NativeTime::Pattern(NATIVE_TIME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::sources::paginate;
    use crate::sources::testing::StubFetcher;

    const HASH: &str = "c0ffeec0ffeec0ffeec0ffeec0ffeec0ffeec0ff";

    fn page() -> String {
        format!(
            r#"
            <table class="torrent-list"><tbody>
              <tr class="success">
                <td><a href="/?c=1_2" title="Anime - English-translated">cat</a></td>
                <td colspan="2">
                  <a href="/view/1#comments" class="comments" title="3 comments">3</a>
                  <a href="/view/1" title="[SubsPlease] Dandadan - 01 (1080p) [ABCD1234].mkv">[SubsPlease] Dandadan - 01</a>
                </td>
                <td class="text-center">
                  <a href="/download/1.torrent"><i class="fa fa-fw fa-download"></i></a>
                  <a href="magnet:?xt=urn:btih:{HASH}&amp;dn=Dandadan"><i class="fa fa-fw fa-magnet"></i></a>
                </td>
                <td class="text-center">1.4 GiB</td>
                <td class="text-center" data-timestamp="1728000000">2024-10-04 00:00</td>
                <td class="text-center">1200</td>
              </tr>
              <tr><td>broken</td></tr>
            </tbody></table>
            "#
        )
    }

    fn nyaa() -> Nyaa {
        Nyaa::new(AdapterSettings::default())
    }

    #[test]
    fn test_page_url() {
        let url = nyaa().page_url(&SearchQuery::new("Dandadan"), false, 2).unwrap();
        assert_eq!(url, "https://nyaa.si/?q=Dandadan&c=1_0&p=2");
    }

    #[test]
    fn test_parse_page_skips_short_rows() {
        let rows = nyaa().parse_page(&page(), 1).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].title,
            "[SubsPlease] Dandadan - 01 (1080p) [ABCD1234].mkv"
        );
        assert_eq!(
            rows[0].link.as_deref(),
            Some(format!("magnet:?xt=urn:btih:{HASH}&dn=Dandadan").as_str())
        );
        assert_eq!(rows[0].released.as_deref(), Some("2024-10-04 00:00"));
    }

    #[test]
    fn test_search_reformats_time_and_size() {
        let fetcher = StubFetcher::default()
            .page("p=1", &page())
            .page("p=2", "<table><tbody></tbody></table>");

        let records = paginate(&nyaa(), &fetcher, &SearchQuery::new("Dandadan")).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].released_at, "2024/10/04 00:00");
        assert_eq!(records[0].size, "1.4GiB");
        assert_eq!(records[0].info_hash().as_deref(), Some(HASH));
    }

    #[test]
    fn test_rejected_page_past_the_end_keeps_results() {
        let fetcher = StubFetcher::default().page("p=1", &page()).reject("p=2");

        let records = paginate(&nyaa(), &fetcher, &SearchQuery::new("Dandadan")).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.requests.borrow().len(), 2);
    }

    #[test]
    fn test_rejected_first_page_is_an_error() {
        let fetcher = StubFetcher::default().reject("p=1");
        let err = paginate(&nyaa(), &fetcher, &SearchQuery::new("x")).unwrap_err();
        assert!(matches!(err, AppError::Rejected { .. }));
    }

    #[test]
    fn test_unreachable_later_page_is_an_error() {
        let fetcher = StubFetcher::default().page("p=1", &page());
        let err = paginate(&nyaa(), &fetcher, &SearchQuery::new("x")).unwrap_err();
        assert!(matches!(err, AppError::Request { url, .. } if url.ends_with("p=2")));
    }
}
