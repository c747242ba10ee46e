//! tokyotosho.info adapter.
//!
//! Each result spans two `.category_0` rows: the first holds the title and
//! magnet link, the second a description line with size and date.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use url::Url;

use super::{
    Adapter, AdapterSettings, NativeTime, PagedSite, RawRow, build_record, search_site,
    selector, skip, text, with_extras,
};
use crate::error::Result;
use crate::models::{Record, SearchQuery};
use crate::utils::http::Fetch;

const NAME: &str = "Tokyotosho";
const BASE_URL: &str = "https://www.tokyotosho.info/search.php";
/// Anime category
const TYPE: &str = "1";
const NATIVE_TIME: &str = "%Y-%m-%d %H:%M";

const CONTAINER: &str = ".listing";
const ROW: &str = ".category_0";
const DESC_TOP: &str = ".desc-top";
const DESC_BOTTOM: &str = ".desc-bot";

/// Adapter for tokyotosho.info.
pub struct Tokyotosho {
    settings: AdapterSettings,
}

impl Tokyotosho {
    pub fn new(settings: AdapterSettings) -> Self {
        Self { settings }
    }

    fn parse_pair(top: ElementRef<'_>, bottom: ElementRef<'_>) -> Result<Option<RawRow>> {
        let Some(desc_top) = top.select(&selector(DESC_TOP)?).next() else {
            skip(NAME, &text(top), "no title cell");
            return Ok(None);
        };
        let title = text(desc_top);
        let link = desc_top
            .select(&selector("a")?)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string);

        let Some(desc_bottom) = bottom.select(&selector(DESC_BOTTOM)?).next() else {
            skip(NAME, &title, "no description");
            return Ok(None);
        };
        let (size, released) = describe(&text(desc_bottom));

        Ok(Some(RawRow {
            title,
            released,
            size,
            link,
        }))
    }
}

/// Size and date from a description line such as
/// `Submitter: x | Size: 1.2GB | Date: 2024-10-04 12:30 UTC | Comment: ...`.
fn describe(line: &str) -> (Option<String>, Option<String>) {
    static SIZE: OnceLock<Option<Regex>> = OnceLock::new();
    static DATE: OnceLock<Option<Regex>> = OnceLock::new();

    let capture = |cell: &OnceLock<Option<Regex>>, pattern: &str| {
        cell.get_or_init(|| Regex::new(pattern).ok())
            .as_ref()
            .and_then(|re| re.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    };

    (
        capture(&SIZE, r"Size:\s*([\d.]+\s*[KMGT]?i?B)"),
        capture(&DATE, r"Date:\s*([\d-]+\s[\d:]+)\s*UTC"),
    )
}

impl Adapter for Tokyotosho {
    fn name(&self) -> &'static str {
        NAME
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Record>> {
        search_site(self, query)
    }
}

impl PagedSite for Tokyotosho {
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
        let mut params = with_extras(
            vec![
                ("terms".to_string(), query.keyword.clone()),
                ("type".to_string(), TYPE.to_string()),
            ],
            query,
        );
        params.push(("page".to_string(), page.to_string()));
        Ok(Url::parse_with_params(BASE_URL, params)?.to_string())
    }

    fn parse_page(&self, html: &str, _page: u32) -> Result<Option<Vec<RawRow>>> {
        let document = Html::parse_document(html);
        let Some(listing) = document.select(&selector(CONTAINER)?).next() else {
            return Ok(None);
        };

        let entries: Vec<_> = listing.select(&selector(ROW)?).collect();
        let mut rows = Vec::new();
        for pair in entries.chunks(2) {
            let [top, bottom] = pair else {
                skip(NAME, &text(pair[0]), "result without a description row");
                continue;
            };
            if let Some(row) = Self::parse_pair(*top, *bottom)? {
                rows.push(row);
            }
        }
        Ok(Some(rows))
    }

    fn to_record(&self, _fetcher: &dyn Fetch, row: RawRow) -> Result<Option<Record>> {
        build_record(NAME, &self.settings, row, NativeTime::Pattern(NATIVE_TIME))
    }
}
