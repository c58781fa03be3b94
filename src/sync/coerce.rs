//! Text-to-typed value coercion.
//!
//! Delimited files carry every cell as text. When `sync.coerce_values` is on,
//! cells that read unambiguously as numbers, booleans or nothing are converted
//! before insertion. Leading zeros are kept as text so identifiers such as
//! `007` survive.

use crate::types::{Record, Value};

/// Coerce one value. Non-text values pass through.
pub fn coerce_value(value: Value) -> Value {
    let Value::Text(text) = value else {
        return value;
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if has_leading_zero(trimmed) {
        return Value::Text(text);
    }
    if let Ok(n) = trimmed.parse::<i64>() {
        return Value::Int(n);
    }
    if looks_numeric(trimmed) {
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return Value::Float(f);
            }
        }
    }
    Value::Text(text)
}

/// Coerce every cell of every record in place.
pub fn coerce_records(records: &mut [Record]) {
    for record in records.iter_mut() {
        for value in record.values_mut() {
            *value = coerce_value(std::mem::take(value));
        }
    }
}

fn has_leading_zero(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    digits.len() > 1 && digits.starts_with('0') && !digits.starts_with("0.")
}

/// Rejects `inf`, `NaN` and similar words `f64::from_str` would accept.
fn looks_numeric(s: &str) -> bool {
    s.chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
}
