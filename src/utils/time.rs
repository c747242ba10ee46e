// src/utils/time.rs

//! Release time reformatting.

use std::fmt::Write;

use chrono::format::{Item, ParseErrorKind, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{AppError, Result};

/// Check that a strftime pattern only contains known specifiers.
pub fn validate_format(pattern: &str) -> Result<()> {
    if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
        return Err(AppError::time_format(format!(
            "invalid time format '{pattern}'"
        )));
    }
    Ok(())
}

/// Parse `native` with `from` and render it with `to`.
///
/// Date-only input patterns are accepted and read as midnight.
pub fn reformat(native: &str, from: &str, to: &str) -> Result<String> {
    let native = native.trim();
    let parsed = match NaiveDateTime::parse_from_str(native, from) {
        Ok(dt) => dt,
        Err(e) if e.kind() == ParseErrorKind::NotEnough => NaiveDate::parse_from_str(native, from)
            .map(|d| d.and_time(NaiveTime::MIN))
            .map_err(|e| AppError::time_format(format!("cannot parse '{native}' as '{from}': {e}")))?,
        Err(e) => {
            return Err(AppError::time_format(format!(
                "cannot parse '{native}' as '{from}': {e}"
            )));
        }
    };
    render(&parsed, to)
}

/// Render a unix timestamp (seconds) in local time.
pub fn from_unix(seconds: &str, to: &str) -> Result<String> {
    let secs: i64 = seconds
        .trim()
        .parse()
        .map_err(|_| AppError::time_format(format!("'{seconds}' is not a unix timestamp")))?;
    let utc = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::time_format(format!("timestamp '{seconds}' is out of range")))?;
    render(&utc.with_timezone(&Local).naive_local(), to)
}

fn render(dt: &NaiveDateTime, to: &str) -> Result<String> {
    validate_format(to)?;
    let mut out = String::new();
    write!(out, "{}", dt.format(to))
        .map_err(|_| AppError::time_format(format!("cannot render time with '{to}'")))?;
    Ok(out)
}
