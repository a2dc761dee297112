use anyhow::{Context, Result};
use serde_json::Value;

/// Decode a line-delimited JSON document into one `Value` per
/// non-empty line, preserving file order.
///
/// A malformed line fails the whole read; the error names the 1-based
/// line number. Callers add the file path context.
pub fn read_jsonl(text: &str) -> Result<Vec<Value>> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        records.push(value);
    }
    Ok(records)
}

/// The `id` field of a record, if present and a string.
pub fn record_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(Value::as_str)
}
