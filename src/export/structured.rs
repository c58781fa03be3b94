//! Structured text (`.json`) export.

use crate::types::{Record, Value};

use super::ExportResult;

/// A pretty-printed JSON array of objects, keys in column order. Missing
/// keys are written as `null`.
pub(super) fn render(columns: &[String], records: &[Record]) -> ExportResult<Vec<u8>> {
    let rows: Vec<serde_json::Value> = records
        .iter()
        .map(|record| {
            let object = columns
                .iter()
                .map(|column| {
                    let value = record.get(column).map(Value::to_json).unwrap_or_default();
                    (column.clone(), value)
                })
                .collect();
            serde_json::Value::Object(object)
        })
        .collect();

    Ok(serde_json::to_vec_pretty(&rows)?)
}
