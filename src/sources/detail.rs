//! Shared parsing for sites that list releases in a `#data_list` table and
//! publish the magnet only on each release's detail page.
//!
//! The detail page carries the magnet parts in inline script assignments:
//!
//! ```text
//! Config['hash_id'] = "0123...";
//! Config['announce'] = "http://tracker/announce";
//! ```

use std::sync::OnceLock;

use regex::Regex;
use scraper::Html;
use url::Url;

use super::{
    AdapterSettings, NativeTime, RawRow, build_record, cells, children_named, selector, skip,
    text,
};
use crate::error::Result;
use crate::models::{Record, SearchQuery};
use crate::utils::http::Fetch;
use crate::utils::resolve_url;

/// Listing dates carry no time of day.
const NATIVE_TIME: &str = "%Y/%m/%d";
const COMPLETE_PARAM: &str = "complete";

const TIME_CELL: usize = 0;
const TITLE_CELL: usize = 2;
const SIZE_CELL: usize = 3;

/// Scripts in the page body, tried before every other script on the page.
const BODY_SCRIPTS: &str = "#btm script";

/// Query string for a listing page: keyword, optional collection filter, extras, page.
pub(crate) fn listing_url(
    base_url: &str,
    query: &SearchQuery,
    collected: bool,
    page: u32,
) -> Result<String> {
    let mut params = vec![("keyword".to_string(), query.keyword.clone())];
    if collected {
        params.push((COMPLETE_PARAM.to_string(), "1".to_string()));
    }
    params = super::with_extras(params, query);
    params.push(("page".to_string(), page.to_string()));
    Ok(Url::parse_with_params(base_url, params)?.to_string())
}

/// Rows of a listing page. Each row's link is the detail page URL.
pub(crate) fn parse_listing(
    site_name: &str,
    html: &str,
    page: u32,
    container: &str,
    domain: &str,
) -> Result<Option<Vec<RawRow>>> {
    let document = Html::parse_document(html);
    let Some(tbody) = document.select(&selector(container)?).next() else {
        return Ok(None);
    };

    let anchor = selector("a")?;
    let base = Url::parse(domain)?;

    let mut rows = Vec::new();
    for tr in children_named(tbody, "tr") {
        let tds = cells(site_name, page, tr, SIZE_CELL + 1)?;
        let title_anchor = tds[TITLE_CELL].select(&anchor).next();

        rows.push(RawRow {
            title: title_anchor.map(text).unwrap_or_default(),
            released: Some(text(tds[TIME_CELL])).filter(|s| !s.is_empty()),
            size: Some(text(tds[SIZE_CELL])).filter(|s| !s.is_empty()),
            link: title_anchor
                .and_then(|a| a.value().attr("href"))
                .map(|href| resolve_url(&base, href)),
        });
    }
    Ok(Some(rows))
}

/// Fetch a row's detail page and turn the row into a record with a magnet link.
///
/// Failing to fetch the detail page aborts the search. A page without the
/// magnet parts skips the row.
pub(crate) fn record_from_detail(
    site_name: &str,
    settings: &AdapterSettings,
    fetcher: &dyn Fetch,
    mut row: RawRow,
) -> Result<Option<Record>> {
    if row.title.is_empty() {
        return Ok(skip(site_name, &row.title, "empty title"));
    }
    let Some(detail_url) = row.link.take() else {
        return Ok(skip(site_name, &row.title, "no detail page link"));
    };

    log::debug!("Fetching detail page for {}", row.title);
    let bytes = fetcher.fetch(&detail_url)?;
    let html = String::from_utf8_lossy(&bytes);

    let Some(magnet) = magnet_from_page(&html)? else {
        return Ok(skip(site_name, &row.title, "no magnet on detail page"));
    };
    row.link = Some(magnet);

    build_record(site_name, settings, row, NativeTime::Pattern(NATIVE_TIME))
}

/// Scan the page's scripts, body scripts first, for the magnet parts.
fn magnet_from_page(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    for scope in [BODY_SCRIPTS, "script"] {
        let found = document
            .select(&selector(scope)?)
            .find_map(|script| magnet_from_script(&script.text().collect::<String>()));
        if found.is_some() {
            return Ok(found);
        }
    }
    Ok(None)
}

/// Build `magnet:?xt=urn:btih:{hash}&tr={announce}` from script assignments.
pub(crate) fn magnet_from_script(script: &str) -> Option<String> {
    static HASH: OnceLock<Option<Regex>> = OnceLock::new();
    static ANNOUNCE: OnceLock<Option<Regex>> = OnceLock::new();

    let hash = HASH
        .get_or_init(|| Regex::new(r#"hash_id'\]\s*=\s*"([^"]+)""#).ok())
        .as_ref()?
        .captures(script)?
        .get(1)?
        .as_str();
    let announce = ANNOUNCE
        .get_or_init(|| Regex::new(r#"announce'\]\s*=\s*"([^"]+)""#).ok())
        .as_ref()?
        .captures(script)?
        .get(1)?
        .as_str();

    Some(format!("magnet:?xt=urn:btih:{hash}&tr={announce}"))
}
