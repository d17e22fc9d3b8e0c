use super::Converter;
use crate::error::ConversionError;
use serde_json::{Map, Value};

/// Forces dotted key paths to values given with `--set key=value`.
///
/// Assignments are captured verbatim at start-up and parsed when the converter
/// runs, so a malformed one surfaces as a resolution error.
#[derive(Debug, Clone, Default)]
pub struct OverwriteConverter {
    assignments: Vec<String>,
}

impl OverwriteConverter {
    pub fn new(assignments: Vec<String>) -> Self {
        Self { assignments }
    }

    pub fn assignments(&self) -> &[String] {
        &self.assignments
    }
}

impl Converter for OverwriteConverter {
    fn name(&self) -> &'static str {
        "overwrite"
    }

    fn apply(&self, tree: Value) -> Result<Value, ConversionError> {
        let mut root = match tree {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        for raw in &self.assignments {
            let (path, value) = parse_assignment(raw)?;
            set_path(&mut root, &path, value);
        }
        Ok(Value::Object(root))
    }
}

/// Split `a.b.c=value` into its key path and value.
///
/// The value is read as a YAML scalar, so `2` is a number and `true` a bool.
/// Anything that would parse as a collection stays a plain string.
pub fn parse_assignment(raw: &str) -> Result<(Vec<String>, Value), ConversionError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| ConversionError::MalformedAssignment(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(ConversionError::InvalidKeyPath(key.to_string()));
    }
    let path: Vec<String> = key.split('.').map(str::to_string).collect();
    if path.iter().any(|segment| segment.is_empty()) {
        return Err(ConversionError::InvalidKeyPath(key.to_string()));
    }
    Ok((path, scalar_value(value)))
}

fn scalar_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }
    match serde_yaml::from_str::<Value>(raw) {
        Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => v,
        Ok(Value::Null) if matches!(raw.trim(), "null" | "~") => Value::Null,
        _ => Value::String(raw.to_string()),
    }
}

/// Create or replace the value at `path`, replacing any non-mapping node along
/// the way with a mapping.
fn set_path(root: &mut Map<String, Value>, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = root;
    for segment in parents {
        let entry = node
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(map) = entry else {
            return;
        };
        node = map;
    }
    node.insert(last.clone(), value);
}
