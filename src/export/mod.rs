//! Table export to downloadable files.
//!
//! [`ExportWriter`] reads every row of a table through the [`TableStore`]
//! and serializes it in any supported format:
//!
//! | format          | empty table                  | missing keys |
//! |-----------------|------------------------------|--------------|
//! | spreadsheet     | workbook with an empty sheet | empty cell   |
//! | delimited text  | empty file                   | empty field  |
//! | structured text | `[]`                         | `null`       |

mod delimited;
mod error;
mod spreadsheet;
mod structured;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexSet;

use crate::storage::TableStore;
use crate::types::{FileFormat, Record, TableName};

pub use error::{ExportError, ExportResult};
pub use spreadsheet::{MAX_COLUMNS, MAX_DATA_ROWS};

/// Serialized table contents plus a timestamped file name.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    /// `<table>_<timestamp>.<ext>`
    pub file_name: String,
    pub format: FileFormat,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Write the file into `dir`, creating the directory if needed.
    pub async fn write_to_dir(&self, dir: &Path) -> ExportResult<PathBuf> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        crate::log_event!(
            "export",
            "written",
            "{} ({} bytes)",
            path.display(),
            self.bytes.len()
        );
        Ok(path)
    }
}

/// Exports tables from a store.
#[derive(Clone)]
pub struct ExportWriter {
    store: Arc<dyn TableStore>,
}

impl ExportWriter {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self { store }
    }

    /// Read all of `table` and serialize it as `format`.
    pub async fn export_table(
        &self,
        table: &TableName,
        format: FileFormat,
    ) -> ExportResult<ExportedFile> {
        let records = self.store.select_all(table).await?;
        let bytes = render(table, format, &records)?;

        crate::debug_event!(
            "export",
            "rendered",
            "{table} as {format}: {} rows, {} bytes",
            records.len(),
            bytes.len()
        );
        Ok(ExportedFile {
            file_name: export_file_name(table, format, Utc::now()),
            format,
            bytes,
        })
    }
}

/// Serialize records as `format`. `table` names the worksheet.
pub fn render(table: &TableName, format: FileFormat, records: &[Record]) -> ExportResult<Vec<u8>> {
    let columns = columns(records);
    match format {
        FileFormat::Spreadsheet => spreadsheet::render(table, &columns, records),
        FileFormat::Delimited => delimited::render(&columns, records),
        FileFormat::Structured => structured::render(&columns, records),
    }
}

/// Key order of the first record, then keys first seen in later records.
pub fn columns(records: &[Record]) -> Vec<String> {
    let mut columns = IndexSet::new();
    for record in records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.insert(key.clone());
            }
        }
    }
    columns.into_iter().collect()
}

/// `<table>_<instant>.<ext>` with `:` and `.` in the UTC instant replaced
/// by `-`, e.g. `equipment_2024-03-15T12-00-00-000Z.csv`.
pub fn export_file_name(table: &TableName, format: FileFormat, at: DateTime<Utc>) -> String {
    let stamp = at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("{table}_{stamp}.{}", format.extension())
}
