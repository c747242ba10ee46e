// src/error.rs

//! Unified error handling for the search library.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Request failed after retries
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The server answered, but not with a `200` HTML page
    #[error("Response from {url} rejected: {message}")]
    Rejected { url: String, message: String },

    /// A result page did not have the expected structure
    #[error("Failed to parse page {page} of {source_name}: {message}")]
    Parse {
        source_name: String,
        page: u32,
        message: String,
    },

    /// No adapter is registered under the requested name
    #[error("Plugin '{0}' not found")]
    PluginNotFound(String),

    /// Size string or unit could not be converted
    #[error("Size format error: {0}")]
    SizeFormat(String),

    /// Time string or pattern was invalid
    #[error("Time format error: {0}")]
    TimeFormat(String),

    /// No search has produced results yet
    #[error("No search results available")]
    NoResults,

    /// Selection index outside the current results
    #[error("Index {index} is out of range for {len} results")]
    OutOfRange { index: isize, len: usize },

    /// Writing results to disk failed
    #[error("Failed to save CSV file '{path}': {message}")]
    SaveCsv { path: String, message: String },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a request error for the given URL.
    pub fn request(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Request {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create an error for a response with the wrong status or content type.
    pub fn rejected(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Rejected {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a page parse error with context.
    pub fn parse(source_name: impl Into<String>, page: u32, message: impl fmt::Display) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            page,
            message: message.to_string(),
        }
    }

    /// Create a size format error.
    pub fn size_format(message: impl Into<String>) -> Self {
        Self::SizeFormat(message.into())
    }

    /// Create a time format error.
    pub fn time_format(message: impl Into<String>) -> Self {
        Self::TimeFormat(message.into())
    }

    /// Create a CSV save error for the given path.
    pub fn save_csv(path: &Path, message: impl fmt::Display) -> Self {
        Self::SaveCsv {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}
