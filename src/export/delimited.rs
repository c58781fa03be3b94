//! Delimited text (`.csv`) export.

use crate::types::Record;

use super::{ExportError, ExportResult};

/// Header line plus one line per record, `\n` terminated. Missing keys and
/// nulls are written as empty fields. An empty table is an empty file.
pub(super) fn render(columns: &[String], records: &[Record]) -> ExportResult<Vec<u8>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|column| record.get(column).map(ToString::to_string).unwrap_or_default()),
        )?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))
}
