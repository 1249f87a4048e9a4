use serde_json::Value;
use tracing::debug;

/// Key of the `[key, value]` pair that carries the score in array payloads.
const GABC_ENTRY_KEY: &str = "gabc";

/// Pull the notation source out of a record's `gabc` field.
///
/// The field is either a JSON array of `[key, value]` pairs, a JSON string, or
/// plain GABC text that is not JSON at all. Anything unusable yields an empty
/// string; callers treat that as "no score available".
pub fn extract_source(field: Option<&str>) -> String {
    let Some(raw) = field else {
        return String::new();
    };
    if raw.trim().is_empty() {
        return String::new();
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => entries
            .iter()
            .find_map(|entry| match entry {
                Value::Array(pair) if pair.first().and_then(Value::as_str) == Some(GABC_ENTRY_KEY) => {
                    Some(pair.get(1).and_then(Value::as_str).unwrap_or_default())
                }
                _ => None,
            })
            .map(|source| source.trim().to_string())
            .unwrap_or_default(),
        Ok(Value::String(source)) => source.trim().to_string(),
        Ok(other) => {
            debug!(kind = ?other, "gabc field holds an unsupported JSON value");
            String::new()
        }
        Err(_) => raw.trim().to_string(),
    }
}
