//! The merged, converted configuration handed to the pipeline engine.

use super::location::Location;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Result of one successful [`ConfigProvider::get`](super::ConfigProvider::get).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    tree: Value,
    locations: Vec<Location>,
}

impl ResolvedConfig {
    pub fn new(tree: Value, locations: Vec<Location>) -> Self {
        Self { tree, locations }
    }

    /// Value at a dotted key path such as `service.telemetry.logs.level`.
    /// Numeric segments index into sequences.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if path.is_empty() {
            return Some(&self.tree);
        }
        path.split('.').try_fold(&self.tree, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    /// String at a dotted key path, if the value there is a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Top-level keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.as_map().into_iter().flat_map(|m| m.keys().map(String::as_str))
    }

    pub fn as_map(&self) -> Option<&Map<String, Value>> {
        self.tree.as_object()
    }

    pub fn as_value(&self) -> &Value {
        &self.tree
    }

    pub fn into_value(self) -> Value {
        self.tree
    }

    /// Locations this configuration was built from, in merge order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Deserialize the whole tree into a typed configuration struct.
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.tree)
    }

    /// Deserialize the subtree at `path`. A missing path deserializes from null.
    pub fn deserialize_at<T: DeserializeOwned>(&self, path: &str) -> Result<T, serde_json::Error> {
        T::deserialize(self.get(path).unwrap_or(&Value::Null))
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.tree)
    }
}
