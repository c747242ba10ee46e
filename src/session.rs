// src/session.rs

//! Search session: runs one adapter and holds its results and selection.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{Config, HttpConfig, Record, SearchQuery};
use crate::sources::{Adapter, AdapterSettings, registry};
use crate::storage;
use crate::utils::time::validate_format;

/// Options for building a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Adapter name, matched case-insensitively
    pub plugin: String,
    /// Override the adapter's TLS verification default
    pub verify_tls: Option<bool>,
    /// Override the output time pattern
    pub time_format: Option<String>,
    /// Log failed searches and return no results instead of an error
    pub suppress_errors: bool,
    pub http: HttpConfig,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionOptions {
    fn from(config: &Config) -> Self {
        Self {
            plugin: config.search.default_plugin.clone(),
            verify_tls: Some(config.search.verify_tls),
            time_format: Some(config.search.time_format.clone()),
            suppress_errors: config.search.suppress_errors,
            http: config.http.clone(),
        }
    }
}

impl SessionOptions {
    pub fn plugin(mut self, name: impl Into<String>) -> Self {
        self.plugin = name.into();
        self
    }
}

/// One adapter plus the state of the latest search.
///
/// Results are `None` until a search succeeds. Every search discards the
/// previous results and selection before running.
pub struct Session {
    adapter: Box<dyn Adapter>,
    suppress_errors: bool,
    results: Option<Vec<Record>>,
    selected: Option<usize>,
}

impl Session {
    /// Build a session for the named adapter.
    ///
    /// Fails with a time format error for an invalid pattern and with
    /// plugin-not-found for an unknown adapter name.
    pub fn new(options: SessionOptions) -> Result<Self> {
        let mut settings = AdapterSettings {
            http: options.http,
            ..AdapterSettings::default()
        };
        if let Some(pattern) = options.time_format {
            validate_format(&pattern)?;
            settings.time_format = pattern;
        }
        if let Some(verify) = options.verify_tls {
            settings.verify_tls = verify;
        }

        let constructor = registry::resolve(&options.plugin)?;
        let adapter = constructor(settings);
        log::info!("Successfully loaded plugin: {}", adapter.name());

        Ok(Self::with_adapter(adapter, options.suppress_errors))
    }

    /// Build a session around an already constructed adapter.
    pub fn with_adapter(adapter: Box<dyn Adapter>, suppress_errors: bool) -> Self {
        if suppress_errors {
            log::warn!("Search errors will not be raised.");
        }
        Self {
            adapter,
            suppress_errors,
            results: None,
            selected: None,
        }
    }

    /// Run a search, replacing any previous results and selection.
    pub fn search(&mut self, query: &SearchQuery) -> Result<&[Record]> {
        self.results = None;
        self.selected = None;

        match self.adapter.search(query) {
            Ok(records) => {
                log::info!("Search completed successfully: {}", query.keyword);
                Ok(self.results.insert(records).as_slice())
            }
            Err(e) if self.suppress_errors => {
                log::error!("Search failed for '{}': {}", query.keyword, e);
                Ok(&[])
            }
            Err(e) => {
                log::error!("Search failed for '{}': {}", query.keyword, e);
                Err(e)
            }
        }
    }

    /// Select a record by 0-based index.
    pub fn select(&mut self, index: isize) -> Result<&Record> {
        let results = match self.results.as_deref() {
            Some(results) if !results.is_empty() => results,
            _ => return Err(AppError::NoResults),
        };
        let position = usize::try_from(index)
            .ok()
            .filter(|&i| i < results.len())
            .ok_or(AppError::OutOfRange {
                index,
                len: results.len(),
            })?;

        self.selected = Some(position);
        Ok(&results[position])
    }

    /// Results of the last successful search.
    pub fn results(&self) -> Option<&[Record]> {
        self.results.as_deref()
    }

    /// The selected record, if any.
    pub fn selected(&self) -> Option<&Record> {
        let results = self.results.as_deref()?;
        results.get(self.selected?)
    }

    pub fn is_selected(&self) -> bool {
        self.selected().is_some()
    }

    pub fn plugin_name(&self) -> &'static str {
        self.adapter.name()
    }

    /// Convert every result's size to `unit`.
    ///
    /// All records are converted before any is replaced, so a failure leaves
    /// the results untouched.
    pub fn size_format_all(&mut self, unit: &str) -> Result<()> {
        let results = self.results.as_ref().ok_or(AppError::NoResults)?;
        let formatted = results
            .iter()
            .map(|record| record.size_format(unit))
            .collect::<Result<Vec<_>>>()?;
        self.results = Some(formatted);
        Ok(())
    }

    /// Export the current results as CSV.
    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let results = self.results.as_deref().ok_or(AppError::NoResults)?;
        storage::write_csv(path, results)
    }
}
