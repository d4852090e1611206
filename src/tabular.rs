//! CSV rendering of record sequences returned by tools and resources.

use crate::{AppError, Result};

/// A record with a fixed, ordered column list.
pub trait Record {
    /// Header names, in column order.
    const COLUMNS: &'static [&'static str];

    /// Field values, in the same order as [`Record::COLUMNS`].
    fn fields(&self) -> Vec<String>;
}

/// Render `records` as CSV with a header row.
///
/// An empty slice renders as an empty string, with no header row.
///
/// # Errors
///
/// Returns `AppError::Internal` if CSV encoding fails.
pub fn to_csv<R: Record>(records: &[R]) -> Result<String> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(R::COLUMNS)?;
    for record in records {
        writer.write_record(record.fields())?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::Internal(format!("csv flush failed: {err}")))?;
    String::from_utf8(bytes).map_err(|err| AppError::Internal(format!("csv output not utf-8: {err}")))
}
