//! JSON array parser.

use indexmap::IndexSet;

use crate::types::{FileFormat, Record, Value};

use super::{ParseError, ParseResult, RecordParser};

/// Parses a single JSON array of flat objects.
///
/// Key order follows the objects; the column set is the union of every
/// object's keys in order of first appearance, and keys absent from an
/// object become [`Value::Null`] so that all records share one key set.
#[derive(Debug, Clone, Default)]
pub struct StructuredParser;

impl StructuredParser {
    pub fn new() -> Self {
        Self
    }
}

impl RecordParser for StructuredParser {
    fn format(&self) -> FileFormat {
        FileFormat::Structured
    }

    fn parse(&self, contents: &[u8]) -> ParseResult<Vec<Record>> {
        let document: serde_json::Value = serde_json::from_slice(contents)?;
        let items = match document {
            serde_json::Value::Array(items) => items,
            other => {
                return Err(ParseError::NotAnArray {
                    found: json_kind(&other),
                });
            }
        };

        let mut columns: IndexSet<String> = IndexSet::new();
        let mut rows = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            let serde_json::Value::Object(object) = item else {
                return Err(ParseError::NotAnObject { index });
            };

            let mut row = Record::with_capacity(object.len());
            for (column, raw) in object {
                let value = Value::from_json(raw).ok_or_else(|| ParseError::NestedValue {
                    index,
                    column: column.clone(),
                })?;
                columns.insert(column.clone());
                row.insert(column.clone(), value);
            }
            rows.push(row);
        }

        let records = rows
            .into_iter()
            .map(|mut row| {
                columns
                    .iter()
                    .map(|column| {
                        let value = row.swap_remove(column).unwrap_or(Value::Null);
                        (column.clone(), value)
                    })
                    .collect()
            })
            .collect();

        Ok(records)
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
