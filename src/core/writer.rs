use crate::utils::error::{EtlError, Result};
use serde::Serialize;

/// Renders `header` followed by one row per record. The header is written even
/// when `records` is empty.
pub fn render_csv<R: Serialize>(header: &[&str], records: &[R]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(header)?;
    for record in records {
        writer.serialize(record)?;
    }

    writer.into_inner().map_err(|e| EtlError::IoError(e.into_error()))
}
