//! CSV export of a poll's responses.

use std::io::Write;

use chrono::NaiveDate;
use snafu::ResultExt;

use crate::error::{ExportSnafu, Result};
use crate::model::Response;

/// Write one row per response with columns `response,timestamp`.
pub fn write_responses_csv<W: Write>(writer: W, responses: &[Response]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    // An empty export still carries the header row.
    out.write_record(["response", "timestamp"])
        .context(ExportSnafu)?;
    for response in responses {
        let timestamp = response.timestamp.to_rfc3339();
        out.write_record([response.response.as_str(), timestamp.as_str()])
            .context(ExportSnafu)?;
    }
    out.flush().map_err(csv::Error::from).context(ExportSnafu)?;
    Ok(())
}

/// Download name for an export taken on `date`: `<poll_id>_<YYYYMMDD>.csv`.
///
/// Characters outside `[A-Za-z0-9_-]` in the id become `_` so the name is
/// safe in a path and in a `Content-Disposition` header.
pub fn export_file_name(poll_id: &str, date: NaiveDate) -> String {
    let stem: String = poll_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}.csv", stem, date.format("%Y%m%d"))
}
