//! Spreadsheet (`.xlsx`) export backed by rust_xlsxwriter.

use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use crate::types::{Record, TableName, Value, excel_serial};

use super::{ExportError, ExportResult};

/// Data rows a worksheet can hold below the header row.
pub const MAX_DATA_ROWS: usize = 1_048_575;
/// Columns a worksheet can hold.
pub const MAX_COLUMNS: usize = 16_384;

const COLUMN_WIDTH: f64 = 15.0;
const DATE_NUM_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const MAX_SHEET_NAME: usize = 31;

/// One worksheet named after the table: a bold header row, 15-wide
/// columns, dates as date-formatted serial numbers. Nulls and missing keys
/// leave the cell empty.
pub(super) fn render(
    table: &TableName,
    columns: &[String],
    records: &[Record],
) -> ExportResult<Vec<u8>> {
    if records.len() > MAX_DATA_ROWS || columns.len() > MAX_COLUMNS {
        return Err(ExportError::TooLarge {
            rows: records.len(),
            columns: columns.len(),
            max_rows: MAX_DATA_ROWS,
            max_columns: MAX_COLUMNS,
        });
    }

    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_NUM_FORMAT);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name(table))?;

    for (col, column) in columns.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, column, &header_format)?;
        worksheet.set_column_width(col, COLUMN_WIDTH)?;
    }

    for (row, record) in records.iter().enumerate() {
        let row = row as u32 + 1;
        for (col, column) in columns.iter().enumerate() {
            if let Some(value) = record.get(column) {
                write_cell(worksheet, row, col as u16, value, &date_format)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    date_format: &Format,
) -> Result<(), XlsxError> {
    match value {
        Value::Null => {}
        Value::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
        Value::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Value::Float(f) if f.is_finite() => {
            worksheet.write_number(row, col, *f)?;
        }
        Value::Float(f) => {
            worksheet.write_string(row, col, f.to_string())?;
        }
        Value::Text(s) => {
            worksheet.write_string(row, col, s)?;
        }
        Value::Date(d) => match excel_serial(d) {
            Some(serial) if serial >= 0.0 => {
                worksheet.write_number_with_format(row, col, serial, date_format)?;
            }
            _ => {
                worksheet.write_string(row, col, value.to_string())?;
            }
        },
    }
    Ok(())
}

/// Worksheet names are at most 31 characters and exclude `[]:*?/\`.
fn sheet_name(table: &TableName) -> String {
    let name: String = table
        .as_str()
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            c => c,
        })
        .take(MAX_SHEET_NAME)
        .collect();
    let name = name.trim_matches('\'');
    if name.is_empty() || name.eq_ignore_ascii_case("history") {
        "Sheet1".to_string()
    } else {
        name.to_string()
    }
}
