//! Scalar cell values carried by records.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Textual format used whenever a date has to be rendered as text.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// A single cell value.
///
/// The serde representation is tagged (`{"type": "int", "value": 3}`) so that
/// stores persisting records keep the exact variant. Use [`Value::to_json`]
/// and [`Value::from_json`] for the natural JSON form used by the structured
/// text format and HTTP stores.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Date(NaiveDateTime),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Natural JSON form: dates become strings, everything else maps directly.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
        }
    }

    /// Convert a scalar JSON value. Returns `None` for arrays and objects.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            serde_json::Value::String(s) => Some(Value::Text(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }

    /// Build a date from an Excel serial day number (days since 1899-12-30).
    ///
    /// Serials are rounded to the nearest second. Serials before 1900-03-01
    /// inherit Excel's phantom 1900-02-29 and come out one day late.
    pub fn from_excel_serial(serial: f64) -> Option<Self> {
        excel_epoch()
            .and_then(|epoch| {
                let seconds = (serial * SECONDS_PER_DAY).round();
                if !seconds.is_finite() {
                    return None;
                }
                TimeDelta::try_seconds(seconds as i64)
                    .and_then(|delta| epoch.checked_add_signed(delta))
            })
            .map(Value::Date)
    }
}

/// Excel serial day number for a date-time, the inverse of
/// [`Value::from_excel_serial`].
pub fn excel_serial(date: &NaiveDateTime) -> Option<f64> {
    let epoch = excel_epoch()?;
    let millis = date.signed_duration_since(epoch).num_milliseconds();
    Some(millis as f64 / (SECONDS_PER_DAY * 1000.0))
}

fn excel_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(d: NaiveDateTime) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_renders_plain_text() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(1.5).to_string(), "1.5");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::from("SN001").to_string(), "SN001");
    }

    #[test]
    fn test_json_conversion_keeps_scalars() {
        let json = serde_json::json!([null, true, 7, 2.25, "x", [1], {"a": 1}]);
        let values: Vec<Option<Value>> = json
            .as_array()
            .unwrap()
            .iter()
            .map(Value::from_json)
            .collect();

        assert_eq!(values[0], Some(Value::Null));
        assert_eq!(values[1], Some(Value::Bool(true)));
        assert_eq!(values[2], Some(Value::Int(7)));
        assert_eq!(values[3], Some(Value::Float(2.25)));
        assert_eq!(values[4], Some(Value::from("x")));
        assert_eq!(values[5], None);
        assert_eq!(values[6], None);
    }

    #[test]
    fn test_non_finite_float_becomes_json_null() {
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn test_excel_serial_conversion() {
        // 2024-03-15 12:00:00
        let value = Value::from_excel_serial(45366.5).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert_eq!(value, Value::Date(expected));
        assert_eq!(excel_serial(&expected), Some(45366.5));
    }

    #[test]
    fn test_tagged_serde_keeps_variant() {
        let json = serde_json::to_string(&Value::Int(3)).unwrap();
        assert_eq!(json, r#"{"type":"int","value":3}"#);

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Value::Int(3));

        let null: Value = serde_json::from_str(r#"{"type":"null"}"#).unwrap();
        assert!(null.is_null());
    }
}
