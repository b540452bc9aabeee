//! CSV cell typing.
//!
//! Results files carry no schema, so each cell is typed on read the way a
//! dataframe reader would: integers, then floats, then booleans, falling back
//! to text. Empty cells and non-finite floats become `null`.

use serde_json::{Number, Value};

/// Infer a JSON value from raw CSV cell text.
pub fn parse_cell(raw: &str) -> Value {
    let text = raw.trim();
    if text.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = text.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(u) = text.parse::<u64>() {
        return Value::Number(u.into());
    }
    if let Ok(f) = text.parse::<f64>() {
        return Number::from_f64(f).map_or(Value::Null, Value::Number);
    }
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    Value::String(text.to_string())
}

/// Render a JSON value back into CSV cell text.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
