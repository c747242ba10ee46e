//! Release record data structure.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::size::{SizeUnit, convert_size, split_size};

/// A release found on a source site.
///
/// Two records are equal when their links carry the same BitTorrent
/// info-hash. A record without an extractable hash is equal to nothing,
/// not even itself, so only `PartialEq` is implemented.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// Release time, already rendered in the caller's time format
    #[serde(rename = "time")]
    pub released_at: String,

    /// Release title
    pub title: String,

    /// Size as `<value><unit>`, e.g. `350.5MB`
    pub size: String,

    /// Magnet URI, or a torrent/page URL for sites without magnets
    #[serde(rename = "magnet")]
    pub link: String,
}

impl Record {
    pub fn new(
        released_at: impl Into<String>,
        title: impl Into<String>,
        size: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            released_at: released_at.into(),
            title: title.into().trim().to_string(),
            size: size.into().trim().to_string(),
            link: link.into(),
        }
    }

    /// Lowercase info-hash from the `btih:` segment of the link.
    pub fn info_hash(&self) -> Option<String> {
        static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
        let pattern = PATTERN
            .get_or_init(|| Regex::new(r"(?i)btih:([a-f0-9]{40,})").ok())
            .as_ref()?;

        pattern
            .captures(&self.link)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_lowercase())
    }

    /// Numeric value and unit token of the size string.
    pub fn size_value_and_unit(&self) -> Option<(f64, &str)> {
        split_size(&self.size)
    }

    /// Return a copy of this record with its size expressed in `unit`.
    pub fn size_format(&self, unit: &str) -> Result<Record> {
        let target: SizeUnit = unit.parse()?;
        let (value, current) = self.size_value_and_unit().ok_or_else(|| {
            AppError::size_format(format!(
                "cannot read size '{}' of '{}'",
                self.size, self.title
            ))
        })?;

        if current.eq_ignore_ascii_case(unit) {
            return Ok(self.clone());
        }

        let converted = convert_size(value, current, unit)?;
        Ok(Record {
            size: format!("{converted}{target}"),
            ..self.clone()
        })
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        match (self.info_hash(), other.info_hash()) {
            (Some(a), Some(b)) => a == b,
            _ => {
                log::warn!(
                    "Magnet hash extraction failed while comparing '{}' and '{}'",
                    self.title,
                    other.title
                );
                false
            }
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hash = self.info_hash().unwrap_or_else(|| "unknown".to_string());
        write!(f, "Record '{}' with hash {}", self.title, hash)
    }
}
