//! Persistence of search results.

mod export;

pub use export::{CSV_HEADER, write_csv};
