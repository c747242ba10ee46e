// src/utils/http.rs

//! HTTP fetching with retries and proxy selection.

use std::env;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::CONTENT_TYPE;

use crate::error::{AppError, Result};
use crate::models::{HttpConfig, ProxyMap};
use crate::utils::retry::RetryPolicy;

/// Anything that can turn a URL into page bytes.
///
/// Adapters fetch through this trait so tests can serve canned pages.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Per-search options for the HTTP fetcher.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Explicit proxies; take precedence over the system proxy
    pub proxies: Option<ProxyMap>,
    /// Read `http_proxy`/`https_proxy` from the environment
    pub system_proxy: bool,
    /// Verify TLS certificates
    pub verify_tls: bool,
}

/// Blocking fetcher that validates responses as HTML pages.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    config: HttpConfig,
    proxies: Option<ProxyMap>,
    verify_tls: bool,
}

impl HttpFetcher {
    /// Create a fetcher, resolving proxies once for its lifetime.
    pub fn new(config: &HttpConfig, options: FetchOptions) -> Self {
        let proxies = resolve_proxies(options.proxies, options.system_proxy, |key| {
            env::var(key).ok()
        });
        if !options.verify_tls {
            log::debug!("TLS certificate verification is disabled");
        }

        Self {
            config: config.clone(),
            proxies,
            verify_tls: options.verify_tls,
        }
    }

    /// Build a client for one fetch-retry sequence.
    fn create_client(&self) -> Result<Client> {
        let mut builder = Client::builder()
            .user_agent(&self.config.user_agent)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .danger_accept_invalid_certs(!self.verify_tls)
            .no_proxy();

        for (scheme, url) in self.proxies.iter().flatten() {
            let proxy = match scheme.to_lowercase().as_str() {
                "http" => reqwest::Proxy::http(url),
                "https" => reqwest::Proxy::https(url),
                "all" => reqwest::Proxy::all(url),
                other => {
                    log::warn!("Ignoring proxy for unknown scheme '{other}'");
                    continue;
                }
            }
            .map_err(|e| AppError::config(format!("invalid proxy '{url}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        builder
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.config.max_attempts,
            backoff: Duration::from_millis(self.config.retry_backoff_ms),
        }
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let client = self.create_client()?;

        let response = self
            .retry_policy()
            .run(|attempt| {
                log::debug!("Requesting {url} (attempt {attempt})");
                client.get(url).send()
            })
            .map_err(|e| {
                log::error!("Failed to get a response from {url}");
                AppError::request(url, e)
            })?;

        read_html(url, response)
    }
}

/// Accept only `200 OK` responses with an HTML content type.
///
/// Other responses are [`AppError::Rejected`]; transport failures stay
/// [`AppError::Request`].
fn read_html(url: &str, response: Response) -> Result<Vec<u8>> {
    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if status != StatusCode::OK || !content_type.to_ascii_lowercase().starts_with("text/html") {
        log::error!("Unexpected response from {url}: {status}, content-type '{content_type}'");
        return Err(AppError::rejected(
            url,
            format!("unexpected response {status} with content-type '{content_type}'"),
        ));
    }

    let body = response
        .bytes()
        .map_err(|e| AppError::request(url, format!("failed to read body: {e}")))?;
    Ok(body.to_vec())
}

/// Pick the proxies for a search.
///
/// Explicit proxies win. Otherwise, in system mode, whichever of
/// `http_proxy`/`https_proxy` is set is used; if neither is, a warning is
/// logged and no proxy applies.
pub fn resolve_proxies<F>(
    explicit: Option<ProxyMap>,
    system_proxy: bool,
    lookup: F,
) -> Option<ProxyMap>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(proxies) = explicit.filter(|p| !p.is_empty()) {
        return Some(proxies);
    }
    if !system_proxy {
        return None;
    }

    let proxies: ProxyMap = [("http", "http_proxy"), ("https", "https_proxy")]
        .into_iter()
        .filter_map(|(scheme, var)| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .map(|v| (scheme.to_string(), v))
        })
        .collect();

    if proxies.is_empty() {
        log::warn!("No system proxy found.");
        None
    } else {
        Some(proxies)
    }
}
