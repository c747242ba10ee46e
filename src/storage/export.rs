//! CSV export of a result set.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Record;

/// Column order of exported files.
pub const CSV_HEADER: [&str; 4] = ["time", "title", "size", "magnet"];

/// Write records to `path` as UTF-8 CSV, one row per record, header first.
///
/// Any failure is reported as a save error naming the path.
pub fn write_csv(path: impl AsRef<Path>, records: &[Record]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path).map_err(|e| AppError::save_csv(path, e))?;

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| AppError::save_csv(path, e))?;
    for record in records {
        writer
            .write_record([
                record.released_at.as_str(),
                record.title.as_str(),
                record.size.as_str(),
                record.link.as_str(),
            ])
            .map_err(|e| AppError::save_csv(path, e))?;
    }
    writer.flush().map_err(|e| AppError::save_csv(path, e))?;

    log::info!("Saved {} records to {}", records.len(), path.display());
    Ok(())
}
