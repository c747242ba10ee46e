//! Search query parameters.

use std::collections::BTreeMap;

/// Proxy URLs keyed by scheme (`http`, `https` or `all`).
pub type ProxyMap = BTreeMap<String, String>;

/// Parameters of a single search.
#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Search keyword
    pub keyword: String,

    /// Restrict to complete collections; `None` uses the adapter default
    pub collected: Option<bool>,

    /// Explicit proxies, used verbatim
    pub proxies: Option<ProxyMap>,

    /// Read proxies from `http_proxy`/`https_proxy`
    pub system_proxy: Option<bool>,

    /// Extra query parameters passed to the site unchanged
    pub extra: BTreeMap<String, String>,
}

impl SearchQuery {
    /// Create a new search query for the given keyword.
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            ..Default::default()
        }
    }

    /// Set the collection filter.
    pub fn collected(mut self, collected: bool) -> Self {
        self.collected = Some(collected);
        self
    }

    /// Use explicit proxies. An empty map is treated as no proxies.
    pub fn proxies(mut self, proxies: ProxyMap) -> Self {
        self.proxies = (!proxies.is_empty()).then_some(proxies);
        self
    }

    /// Read proxies from the environment.
    pub fn system_proxy(mut self, enabled: bool) -> Self {
        self.system_proxy = Some(enabled);
        self
    }

    /// Add an extra query parameter.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_builder() {
        let query = SearchQuery::new("Frieren")
            .collected(true)
            .system_proxy(true)
            .extra("team_id", "117");

        assert_eq!(query.keyword, "Frieren");
        assert_eq!(query.collected, Some(true));
        assert_eq!(query.system_proxy, Some(true));
        assert_eq!(query.extra.get("team_id").map(String::as_str), Some("117"));
        assert!(query.proxies.is_none());
    }

    #[test]
    fn test_empty_proxy_map_is_ignored() {
        let query = SearchQuery::new("x").proxies(ProxyMap::new());
        assert!(query.proxies.is_none());
    }
}
