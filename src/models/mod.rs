// src/models/mod.rs

//! Domain models for the search library.

mod config;
mod query;
mod record;
mod size;

pub use config::{Config, HttpConfig, LoggingConfig, SearchConfig};
pub use query::{ProxyMap, SearchQuery};
pub use record::Record;
pub use size::{SizeUnit, convert_size, split_size};
