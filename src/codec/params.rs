//! Bracket-style query encoding.
//!
//! Nested objects become `a[b]=1`, arrays of scalars become `list[]=x`,
//! arrays of objects become `list[0][k]=v`. `null` values are skipped;
//! booleans and numbers use their JSON text.

use serde_json::Value;
use url::form_urlencoded;

/// Serialize request data into a query string (no leading `?`).
///
/// A scalar at the top level has no key and yields an empty string.
pub fn serialize_params(params: &Value) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            flatten(key.clone(), value, &mut pairs);
        }
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    serializer.finish()
}

fn flatten(prefix: String, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Null => {}
        Value::Bool(b) => out.push((prefix, b.to_string())),
        Value::Number(n) => out.push((prefix, n.to_string())),
        Value::String(s) => out.push((prefix, s.clone())),
        Value::Array(items) => {
            let nested = items.iter().any(|v| v.is_object() || v.is_array());
            for (index, item) in items.iter().enumerate() {
                let key = if nested {
                    format!("{prefix}[{index}]")
                } else {
                    format!("{prefix}[]")
                };
                flatten(key, item, out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten(format!("{prefix}[{key}]"), item, out);
            }
        }
    }
}
