//! Deep merge of configuration fragments.
//!
//! Fragments are merged key by key with later fragments taking precedence.
//! Sequences are replaced entirely, not concatenated.

use serde_json::{Map, Value};

/// Deep merge `overlay` into `base`, with `overlay` taking precedence.
///
/// - Mappings are merged recursively: keys in overlay override keys in base,
///   keys present on only one side are kept
/// - Sequences, scalars and explicit nulls in overlay replace base entirely
///
/// # Example
/// ```
/// use serde_json::json;
/// use aot_collector::config::deep_merge;
///
/// let base = json!({
///     "exporters": { "otlp": { "endpoint": "a:4317", "tls": { "insecure": true } } },
///     "pipelines": ["traces"]
/// });
/// let overlay = json!({
///     "exporters": { "otlp": { "endpoint": "b:4317" } },
///     "pipelines": ["metrics"]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(result["exporters"]["otlp"]["endpoint"], "b:4317");
/// assert_eq!(result["exporters"]["otlp"]["tls"]["insecure"], true);
/// assert_eq!(result["pipelines"], json!(["metrics"]));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            merge_into(&mut base_map, overlay_map);
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge `overlay` into an existing mapping in place.
pub fn merge_into(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, overlay_value) in overlay {
        let merged = match base.remove(&key) {
            Some(base_value) => deep_merge(base_value, overlay_value),
            None => overlay_value,
        };
        base.insert(key, merged);
    }
}

/// Merge multiple fragments in order, with later fragments taking precedence.
///
/// Starts from an empty mapping, so the result is always a mapping when every
/// fragment is one.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Map::new()), deep_merge)
}
