//! dmhy.org adapter.

use scraper::Html;
use url::Url;

use super::{
    Adapter, AdapterSettings, NativeTime, PagedSite, RawRow, build_record, cells,
    children_named, search_site, selector, text, with_extras,
};
use crate::error::Result;
use crate::models::{Record, SearchQuery};
use crate::utils::http::Fetch;

const NAME: &str = "Dmhy";
const PAGE_URL: &str = "https://dmhy.org/topics/list/page/";
/// `sort_id` of the complete-collection category
const COLLECTION_SORT_ID: &str = "31";
const NATIVE_TIME: &str = "%Y/%m/%d %H:%M";

const CONTAINER: &str = "tbody";
const TIME_CELL: usize = 0;
const TITLE_CELL: usize = 2;
const MAGNET_CELL: usize = 3;
const SIZE_CELL: usize = 4;
const MAGNET_ANCHOR: &str = ".download-arrow";

/// Adapter for the dmhy.org topic list.
pub struct Dmhy {
    settings: AdapterSettings,
}

impl Dmhy {
    pub fn new(settings: AdapterSettings) -> Self {
        Self { settings }
    }
}

impl Adapter for Dmhy {
    fn name(&self) -> &'static str {
        NAME
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        search_site(self, query)
    }
}

impl PagedSite for Dmhy {
    fn site_name(&self) -> &'static str {
        NAME
    }

    fn settings(&self) -> &AdapterSettings {
        &self.settings
    }

    fn supports_collection(&self) -> bool {
        true
    }

    fn page_url(&self, query: &SearchQuery, collected: bool, page: u32) -> Result<String> {
        let mut params = vec![("keyword".to_string(), query.keyword.clone())];
        if collected {
            params.push(("sort_id".to_string(), COLLECTION_SORT_ID.to_string()));
        }
        let url = Url::parse_with_params(&format!("{PAGE_URL}{page}"), with_extras(params, query))?;
        Ok(url.to_string())
    }

    fn parse_page(&self, html: &str, page: u32) -> Result<Option<Vec<RawRow>>> {
        let document = Html::parse_document(html);
        let Some(tbody) = document.select(&selector(CONTAINER)?).next() else {
            return Ok(None);
        };

        let title_anchor = selector("a")?;
        let time_span = selector("span")?;
        let magnet_anchor = selector(MAGNET_ANCHOR)?;

        let mut rows = Vec::new();
        for tr in children_named(tbody, "tr") {
            let tds = cells(NAME, page, tr, SIZE_CELL + 1)?;
            let released = tds[TIME_CELL]
                .select(&time_span)
                .next()
                .map(text)
                .filter(|s| !s.is_empty());
            let title = tds[TITLE_CELL]
                .select(&title_anchor)
                .last()
                .map(text)
                .unwrap_or_default();
            let link = tds[MAGNET_CELL]
                .select(&magnet_anchor)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(str::to_string);
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
        build_record(NAME, &self.settings, row, NativeTime::Pattern(NATIVE_TIME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::sources::paginate;
    use crate::sources::testing::StubFetcher;

    const PAGE_ONE: &str = r#"
        <html><body><table id="topic_list">
        <thead><tr><th>time</th><th>type</th><th>title</th><th>link</th><th>size</th></tr></thead>
        <tbody>
          <tr>
            <td>今天 <span style="display: none;">2024/05/01 12:34</span></td>
            <td><a class="sort-2">動畫</a></td>
            <td class="title">
              <span class="tag"><a href="/topics/list/team_id/117">喵萌奶茶屋</a></span>
              <a href="/topics/view/1_frieren.html" target="_blank">
                [喵萌奶茶屋] 葬送的芙莉蓮 Frieren - 01 [1080p]
              </a>
            </td>
            <td><a class="download-arrow arrow-magnet" href="magnet:?xt=urn:btih:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA&amp;dn=x">&nbsp;</a></td>
            <td>350.5MB</td>
            <td>10</td>
          </tr>
          <tr>
            <td><span>2024/04/30 08:00</span></td>
            <td></td>
            <td class="title"><a href="/topics/view/2.html">Second</a></td>
            <td></td>
            <td>1.2GB</td>
          </tr>
        </tbody></table></body></html>
    "#;

    fn dmhy() -> Dmhy {
        Dmhy::new(AdapterSettings::default())
    }

    #[test]
    fn test_page_url() {
        let query = SearchQuery::new("葬送 芙莉蓮").extra("team_id", "117");
        let url = dmhy().page_url(&query, true, 2).unwrap();
        assert!(url.starts_with("https://dmhy.org/topics/list/page/2?keyword="));
        assert!(url.contains("sort_id=31"));
        assert!(url.ends_with("&team_id=117"));

        let url = dmhy().page_url(&SearchQuery::new("x"), false, 1).unwrap();
        assert_eq!(url, "https://dmhy.org/topics/list/page/1?keyword=x");
    }

    #[test]
    fn test_parse_page_rows() {
        let rows = dmhy().parse_page(PAGE_ONE, 1).unwrap().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "[喵萌奶茶屋] 葬送的芙莉蓮 Frieren - 01 [1080p]");
        assert_eq!(rows[0].released.as_deref(), Some("2024/05/01 12:34"));
        assert_eq!(rows[0].size.as_deref(), Some("350.5MB"));
        assert_eq!(
            rows[0].link.as_deref(),
            Some("magnet:?xt=urn:btih:AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA&dn=x")
        );
        assert_eq!(rows[1].link, None);
    }

    #[test]
    fn test_parse_page_without_tbody() {
        assert_eq!(dmhy().parse_page("<p>没有可显示资源</p>", 3).unwrap(), None);
    }

    #[test]
    fn test_parse_page_rejects_changed_layout() {
        let html = "<table><tbody><tr><td>only</td><td>two</td></tr></tbody></table>";
        let err = dmhy().parse_page(html, 4).unwrap_err();
        assert!(matches!(err, AppError::Parse { page: 4, .. }));
    }

    #[test]
    fn test_search_collects_until_empty_page() {
        let fetcher = StubFetcher::default()
            .page("/page/1?", PAGE_ONE)
            .page("/page/2?", "<html><body></body></html>");
        let settings = AdapterSettings {
            time_format: "%Y-%m-%d".to_string(),
            ..AdapterSettings::default()
        };

        let records = paginate(&Dmhy::new(settings), &fetcher, &SearchQuery::new("Frieren")).unwrap();

        // The second row has no magnet and is skipped.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].released_at, "2024-05-01");
        assert_eq!(records[0].size, "350.5MB");
        assert_eq!(
            records[0].info_hash().as_deref(),
            Some("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
        );
    }
}
