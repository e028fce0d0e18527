use serde_json::{Map, Value as JsonValue};

/// Lowercase (and trim) every object key in a parsed JSON tree, recursively.
/// Values are left as they are; when two keys collide after normalization the
/// later one wins.
pub fn normalize_key_value(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(obj) => {
            let mut out = Map::with_capacity(obj.len());
            for (key, val) in obj {
                out.insert(key.trim().to_lowercase(), normalize_key_value(val));
            }
            JsonValue::Object(out)
        }
        JsonValue::Array(arr) => {
            JsonValue::Array(arr.into_iter().map(normalize_key_value).collect())
        }
        other => other,
    }
}

/// Normalize the keys of a JSON document given as text.
///
/// Text that does not parse is returned unchanged so the parse error
/// surfaces at decode/validate time with the original positions. Output is
/// compact JSON, so `normalize_keys(normalize_keys(t)) == normalize_keys(t)`.
pub fn normalize_keys(text: &str) -> String {
    match serde_json::from_str::<JsonValue>(text) {
        Ok(root) => serde_json::to_string(&normalize_key_value(root))
            .unwrap_or_else(|_| text.to_string()),
        Err(_) => text.to_string(),
    }
}

/// Canonical form of an enumerant string (`" BlendTree "` -> `"blendtree"`).
pub fn normalize_token(token: &str) -> String {
    token.trim().to_lowercase()
}
