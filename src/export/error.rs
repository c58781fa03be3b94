//! Error types for table export.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised while exporting a table.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to read table: {0}")]
    Storage(#[from] StorageError),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Table has {rows} rows and {columns} columns; a worksheet holds at most {max_rows} data rows and {max_columns} columns")]
    TooLarge {
        rows: usize,
        columns: usize,
        max_rows: usize,
        max_columns: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;
