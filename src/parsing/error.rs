//! Error types for record parsing.

use thiserror::Error;

/// Errors raised while turning file contents into records.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Spreadsheet could not be read: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("Workbook has no worksheets")]
    NoWorksheet,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Row at line {line} has {found} fields but the header has {expected}")]
    RaggedRow { line: u64, expected: u64, found: u64 },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Top-level JSON value must be an array, found {found}")]
    NotAnArray { found: &'static str },

    #[error("Array element {index} is not an object")]
    NotAnObject { index: usize },

    #[error("Array element {index} has a nested value in column '{column}'")]
    NestedValue { index: usize, column: String },
}

pub type ParseResult<T> = Result<T, ParseError>;
