// src/models/size.rs

//! Storage size units and conversion.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{AppError, Result};

/// A storage unit accepted in size strings. Matching is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    B,
    KB,
    MB,
    GB,
    TB,
    KiB,
    MiB,
    GiB,
    TiB,
}

impl SizeUnit {
    /// Number of bytes in one unit. Decimal and binary prefixes share factors.
    pub fn factor(self) -> f64 {
        let shift = match self {
            SizeUnit::B => 0,
            SizeUnit::KB | SizeUnit::KiB => 10,
            SizeUnit::MB | SizeUnit::MiB => 20,
            SizeUnit::GB | SizeUnit::GiB => 30,
            SizeUnit::TB | SizeUnit::TiB => 40,
        };
        (1u64 << shift) as f64
    }

    fn as_str(self) -> &'static str {
        match self {
            SizeUnit::B => "B",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
            SizeUnit::TB => "TB",
            SizeUnit::KiB => "KiB",
            SizeUnit::MiB => "MiB",
            SizeUnit::GiB => "GiB",
            SizeUnit::TiB => "TiB",
        }
    }
}

impl FromStr for SizeUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "B" => Ok(SizeUnit::B),
            "KB" => Ok(SizeUnit::KB),
            "MB" => Ok(SizeUnit::MB),
            "GB" => Ok(SizeUnit::GB),
            "TB" => Ok(SizeUnit::TB),
            "KIB" => Ok(SizeUnit::KiB),
            "MIB" => Ok(SizeUnit::MiB),
            "GIB" => Ok(SizeUnit::GiB),
            "TIB" => Ok(SizeUnit::TiB),
            _ => Err(AppError::size_format(format!("invalid storage unit '{s}'"))),
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Convert `value` between units, rounded to two decimals.
pub fn convert_size(value: f64, from_unit: &str, to_unit: &str) -> Result<f64> {
    let from: SizeUnit = from_unit.parse()?;
    let to: SizeUnit = to_unit.parse()?;
    Ok(round2(value * (from.factor() / to.factor())))
}

/// Split a size string like `"350.5 MB"` into its value and unit token.
pub fn split_size(size: &str) -> Option<(f64, &str)> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)\s*(\w+)$").ok())
        .as_ref()?;

    let caps = pattern.captures(size.trim())?;
    let value = caps.get(1)?.as_str().parse().ok()?;
    let unit = caps.get(2)?.as_str();
    Some((value, unit))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNITS: [&str; 9] = ["B", "KB", "MB", "GB", "TB", "KiB", "MiB", "GiB", "TiB"];

    #[test]
    fn test_convert_size() {
        assert_eq!(convert_size(1.0, "GB", "MB").unwrap(), 1024.0);
        assert_eq!(convert_size(512.0, "MiB", "GiB").unwrap(), 0.5);
        assert_eq!(convert_size(1536.0, "kb", "mb").unwrap(), 1.5);
        assert_eq!(convert_size(350.5, "MB", "MB").unwrap(), 350.5);
    }

    #[test]
    fn test_convert_size_rounds_to_two_decimals() {
        assert_eq!(convert_size(1.0, "MB", "GB").unwrap(), 0.0);
        assert_eq!(convert_size(100.0, "MB", "GB").unwrap(), 0.1);
        assert_eq!(convert_size(1234.0, "KB", "MB").unwrap(), 1.21);
    }

    #[test]
    fn test_convert_size_round_trip() {
        for from in UNITS {
            for to in UNITS {
                let value = 1234.56;
                let there = convert_size(value, from, to).unwrap();
                let back = convert_size(there, to, from).unwrap();
                let from_factor = from.parse::<SizeUnit>().unwrap().factor();
                let to_factor = to.parse::<SizeUnit>().unwrap().factor();
                // Rounding to 0.01 of the target unit is the only source of drift.
                let tolerance = 0.01 + 0.005 * (to_factor / from_factor);
                assert!(
                    (back - value).abs() <= tolerance,
                    "{from} -> {to} -> {from}: {back}"
                );
            }
        }
    }

    #[test]
    fn test_convert_size_rejects_unknown_units() {
        assert!(matches!(
            convert_size(1.0, "PB", "MB"),
            Err(AppError::SizeFormat(msg)) if msg.contains("PB")
        ));
        assert!(matches!(
            convert_size(1.0, "MB", "bytes"),
            Err(AppError::SizeFormat(msg)) if msg.contains("bytes")
        ));
    }

    #[test]
    fn test_split_size() {
        assert_eq!(split_size("350.5MB"), Some((350.5, "MB")));
        assert_eq!(split_size("1.2 GiB"), Some((1.2, "GiB")));
        assert_eq!(split_size("42B"), Some((42.0, "B")));
        assert_eq!(split_size("MB"), None);
        assert_eq!(split_size(""), None);
        assert_eq!(split_size("1,024MB"), None);
    }

    #[test]
    fn test_unit_display_round_trips() {
        for unit in UNITS {
            assert_eq!(unit.parse::<SizeUnit>().unwrap().to_string(), unit);
        }
    }
}
