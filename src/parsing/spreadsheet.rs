//! Spreadsheet (`.xlsx`) parser backed by calamine.

use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use chrono::NaiveDateTime;

use crate::types::{FileFormat, Record, Value};

use super::{ParseError, ParseResult, RecordParser};

/// Reads the first worksheet of a workbook.
///
/// The first row of the used range is the header. Empty header cells are
/// skipped as columns. Every row below the header inside the used range is a
/// record, blank rows included; empty cells read as `Null`. Cells keep their
/// native typing, except that whole numbers in `i64` range read as `Int`
/// since the format stores every number as a float.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetParser;

impl SpreadsheetParser {
    pub fn new() -> Self {
        Self
    }
}

impl RecordParser for SpreadsheetParser {
    fn format(&self) -> FileFormat {
        FileFormat::Spreadsheet
    }

    fn parse(&self, contents: &[u8]) -> ParseResult<Vec<Record>> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(contents))?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(ParseError::NoWorksheet)??;

        let mut rows = range.rows();
        let Some(header) = rows.next() else {
            return Ok(Vec::new());
        };

        let columns: Vec<(usize, String)> = header
            .iter()
            .enumerate()
            .filter_map(|(i, cell)| header_name(cell).map(|name| (i, name)))
            .collect();

        let records = rows
            .map(|row| {
                columns
                    .iter()
                    .map(|(i, name)| {
                        let value = row.get(*i).map(cell_value).unwrap_or(Value::Null);
                        (name.clone(), value)
                    })
                    .collect()
            })
            .collect();

        Ok(records)
    }
}

fn header_name(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        other => Some(other.to_string()),
    }
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::Int(*i),
        Data::Float(f) => whole_number(*f).map_or(Value::Float(*f), Value::Int),
        Data::Bool(b) => Value::Bool(*b),
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::DateTime(dt) => {
            Value::from_excel_serial(dt.as_f64()).unwrap_or(Value::Float(dt.as_f64()))
        }
        Data::DateTimeIso(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
            .map(Value::Date)
            .unwrap_or_else(|_| Value::Text(s.clone())),
        Data::DurationIso(s) => Value::Text(s.clone()),
        Data::Error(e) => Value::Text(e.to_string()),
    }
}

fn whole_number(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}
