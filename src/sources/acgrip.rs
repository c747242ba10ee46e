//! acg.rip adapter.
//!
//! acg.rip only links torrent files, so records carry a torrent URL
//! instead of a magnet URI and have no info-hash.

use scraper::{ElementRef, Html};
use url::Url;

use super::{
    Adapter, AdapterSettings, NativeTime, PagedSite, RawRow, build_record, cells,
    children_named, search_site, selector, text, with_extras,
};
use crate::error::{AppError, Result};
use crate::models::{Record, SearchQuery};
use crate::utils::http::Fetch;
use crate::utils::resolve_url;

const NAME: &str = "Acgrip";
const DOMAIN: &str = "https://acg.rip";
const PAGE_URL: &str = "https://acg.rip/page/";

const HEADER: &str = "thead";
const TIME_CELL: usize = 0;
const TITLE_CELL: usize = 1;
const TORRENT_CELL: usize = 2;
const SIZE_CELL: usize = 3;

/// Adapter for acg.rip.
pub struct Acgrip {
    settings: AdapterSettings,
}

impl Acgrip {
    pub fn new(settings: AdapterSettings) -> Self {
        log::warn!("Using acg.rip searcher can only return torrent download addresses.");
        Self { settings }
    }

    /// Rows following the table header, whether or not the parser wrapped
    /// them in an implicit `tbody`.
    fn rows_after<'a>(header: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        header
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .flat_map(|sibling| match sibling.value().name() {
                "tr" => vec![sibling],
                "tbody" => children_named(sibling, "tr"),
                _ => Vec::new(),
            })
            .collect()
    }
}

impl Adapter for Acgrip {
    fn name(&self) -> &'static str {
        NAME
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        search_site(self, query)
    }
}

impl PagedSite for Acgrip {
    fn site_name(&self) -> &'static str {
        NAME
    }

    fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    fn page_url(&self, query: &SearchQuery, _collected: bool, page: u32) -> Result<String> {
        let params = vec![("term".to_string(), query.keyword.clone())];
        let url = Url::parse_with_params(&format!("{PAGE_URL}{page}"), with_extras(params, query))?;
        Ok(url.to_string())
    }

    fn parse_page(&self, html: &str, page: u32) -> Result<Option<Vec<RawRow>>> {
        let document = Html::parse_document(html);
        // Past the last page the listing has no header; on page 1 the layout changed.
        let Some(header) = document.select(&selector(HEADER)?).next() else {
            if page == 1 {
                return Err(AppError::parse(NAME, page, "listing has no table header"));
            }
            return Ok(None);
        };

        let div = selector("div")?;
        let time = selector("time")?;
        let anchor = selector("a")?;
        let base = Url::parse(DOMAIN)?;

        let mut rows = Vec::new();
        for tr in Self::rows_after(header) {
            let tds = cells(NAME, page, tr, SIZE_CELL + 1)?;
            let released = tds[TIME_CELL]
                .select(&div)
                .nth(1)
                .and_then(|d| d.select(&time).next())
                .and_then(|t| t.value().attr("datetime"))
                .map(str::to_string);
            let title = tds[TITLE_CELL]
                .select(&anchor)
                .last()
                .map(text)
                .unwrap_or_default();
            let link = tds[TORRENT_CELL]
                .select(&anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| resolve_url(&base, href));
            let size = Some(text(tds[SIZE_CELL])).filter(|s| !s.is_empty());

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
        build_record(NAME, &self.settings, row, NativeTime::UnixSeconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::paginate;
    use crate::sources::testing::StubFetcher;

    const PAGE: &str = r#"
        <table class="table post-index">
          <thead><tr><th>发布时间</th><th>标题</th><th>下载</th><th>大小</th></tr></thead>
          <tr>
            <td class="date hidden-xs">
              <div>2024-07-01</div>
              <div><time datetime="1719835200">12:00</time></div>
            </td>
            <td class="title">
              <span class="label label-primary">新番</span>
              <a href="/team/12">LoliHouse</a>
              <a href="/t/305000">[LoliHouse] Oshi no Ko - 12 [WebRip 1080p]</a>
            </td>
            <td class="action"><a href="/t/305000.torrent"><i class="fa fa-download"></i></a></td>
            <td class="size">562.1 MB</td>
          </tr>
        </table>
    "#;

    fn acgrip(time_format: &str) -> Acgrip {
        Acgrip::new(AdapterSettings {
            time_format: time_format.to_string(),
            ..AdapterSettings::default()
        })
    }

    #[test]
    fn test_page_url_ignores_collection() {
        let url = acgrip("%Y").page_url(&SearchQuery::new("Oshi no Ko"), true, 3).unwrap();
        assert_eq!(url, "https://acg.rip/page/3?term=Oshi+no+Ko");
    }

    #[test]
    fn test_parse_page_rows_inside_implicit_tbody() {
        let rows = acgrip("%Y").parse_page(PAGE, 1).unwrap().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].title, "[LoliHouse] Oshi no Ko - 12 [WebRip 1080p]");
        assert_eq!(rows[0].released.as_deref(), Some("1719835200"));
        assert_eq!(rows[0].link.as_deref(), Some("https://acg.rip/t/305000.torrent"));
        assert_eq!(rows[0].size.as_deref(), Some("562.1 MB"));
    }

    #[test]
    fn test_header_only_page_has_no_rows() {
        let html = "<table><thead><tr><th>t</th></tr></thead></table>";
        assert_eq!(acgrip("%Y").parse_page(html, 2).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_missing_header_on_first_page_is_a_parse_error() {
        let html = "<table><tr><td>nothing here</td></tr></table>";
        let err = acgrip("%Y").parse_page(html, 1).unwrap_err();
        assert!(matches!(err, AppError::Parse { page: 1, .. }));

        assert_eq!(acgrip("%Y").parse_page(html, 2).unwrap(), None);
    }

    #[test]
    fn test_search_yields_torrent_links() {
        let fetcher = StubFetcher::default()
            .page("/page/1?", PAGE)
            .page("/page/2?", "<table><thead><tr><th>t</th></tr></thead></table>");

        let records = paginate(&acgrip("%Y"), &fetcher, &SearchQuery::new("x").collected(true)).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].released_at, "2024");
        assert_eq!(records[0].size, "562.1MB");
        assert_eq!(records[0].info_hash(), None);
    }
}
