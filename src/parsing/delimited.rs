//! Comma-separated text parser.

use crate::types::{FileFormat, Record, Value};

use super::{ParseError, ParseResult, RecordParser};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Parses delimited text with a header row.
///
/// Quoted fields may contain the delimiter, doubled quotes and line breaks.
/// Columns with an empty header are skipped. Every value is kept as
/// [`Value::Text`], exactly as written.
#[derive(Debug, Clone)]
pub struct DelimitedParser {
    delimiter: u8,
}

impl DelimitedParser {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Use a delimiter other than a comma (e.g. `b';'` or `b'\t'`).
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for DelimitedParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordParser for DelimitedParser {
    fn format(&self) -> FileFormat {
        FileFormat::Delimited
    }

    fn parse(&self, contents: &[u8]) -> ParseResult<Vec<Record>> {
        let contents = contents.strip_prefix(UTF8_BOM).unwrap_or(contents);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(false)
            .from_reader(contents);

        // (field index, column name) for every non-empty header cell
        let columns: Vec<(usize, String)> = reader
            .headers()
            .map_err(classify)?
            .iter()
            .enumerate()
            .filter(|(_, name)| !name.trim().is_empty())
            .map(|(i, name)| (i, name.to_string()))
            .collect();

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row.map_err(classify)?;
            let record: Record = columns
                .iter()
                .map(|(i, name)| {
                    let value = row.get(*i).map(Value::from).unwrap_or(Value::Null);
                    (name.clone(), value)
                })
                .collect();
            records.push(record);
        }

        Ok(records)
    }
}

/// Surface ragged rows as their own error kind.
fn classify(err: csv::Error) -> ParseError {
    if let csv::ErrorKind::UnequalLengths {
        pos,
        expected_len,
        len,
    } = err.kind()
    {
        return ParseError::RaggedRow {
            line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
            expected: *expected_len,
            found: *len,
        };
    }
    ParseError::Csv(err)
}
