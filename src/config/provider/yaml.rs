use super::{Retrieved, SourceProvider};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde_yaml::{Mapping, Value};

/// Separator for nested keys in inline YAML.
pub const KEY_DELIMITER: &str = "::";

/// Inline YAML given directly in the location, e.g.
/// `yaml:exporters::logging::loglevel: debug`.
///
/// Keys containing `::` are expanded into nested mappings, so the example sets
/// `exporters.logging.loglevel` and merges with other locations like any
/// nested document would.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlProvider;

impl YamlProvider {
    pub const SCHEME: &'static str = "yaml";

    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SourceProvider for YamlProvider {
    fn scheme(&self) -> &str {
        Self::SCHEME
    }

    async fn retrieve(&self, identifier: &str) -> Result<Retrieved, ProviderError> {
        if !identifier.contains(KEY_DELIMITER) {
            return Ok(Retrieved::new(identifier));
        }
        // Invalid YAML is passed through for the resolver to report.
        let Ok(doc) = serde_yaml::from_str::<Value>(identifier) else {
            return Ok(Retrieved::new(identifier));
        };
        match serde_yaml::to_string(&nest_keys(doc)) {
            Ok(nested) => Ok(Retrieved::new(nested)),
            Err(_) => Ok(Retrieved::new(identifier)),
        }
    }
}

/// Expand `a::b: v` keys into `a: {b: v}` at every level.
fn nest_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut out = Mapping::new();
            for (key, item) in map {
                let item = nest_keys(item);
                match key {
                    Value::String(s) if s.contains(KEY_DELIMITER) => {
                        let segments: Vec<&str> = s.split(KEY_DELIMITER).collect();
                        insert_nested(&mut out, &segments, item);
                    }
                    other => insert_merged(&mut out, other, item),
                }
            }
            Value::Mapping(out)
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(nest_keys).collect()),
        other => other,
    }
}

fn insert_nested(map: &mut Mapping, segments: &[&str], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    let key = Value::String((*first).to_string());
    if rest.is_empty() {
        insert_merged(map, key, value);
        return;
    }
    let entry = map
        .entry(key)
        .or_insert_with(|| Value::Mapping(Mapping::new()));
    if !entry.is_mapping() {
        *entry = Value::Mapping(Mapping::new());
    }
    if let Value::Mapping(child) = entry {
        insert_nested(child, rest, value);
    }
}

/// Insert `value` at `key`, merging with an existing mapping there.
fn insert_merged(map: &mut Mapping, key: Value, value: Value) {
    match (map.get_mut(&key), value) {
        (Some(Value::Mapping(existing)), Value::Mapping(incoming)) => {
            for (k, v) in incoming {
                insert_merged(existing, k, v);
            }
        }
        (_, value) => {
            map.insert(key, value);
        }
    }
}
