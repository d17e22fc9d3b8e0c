use super::Converter;
use crate::config::env::EnvLookup;
use crate::error::ConversionError;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// What to do with a `${NAME}` whose variable is unset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpandMode {
    /// Leave the reference as literal text.
    #[default]
    Permissive,
    /// Fail with [`ConversionError::UnresolvedVariable`].
    Strict,
}

/// Replaces `${NAME}` in every string value with the environment value of
/// `NAME`. Mapping keys are left alone.
pub struct ExpandConverter {
    env: Arc<dyn EnvLookup>,
    mode: ExpandMode,
}

impl ExpandConverter {
    pub fn new(env: Arc<dyn EnvLookup>) -> Self {
        Self {
            env,
            mode: ExpandMode::Permissive,
        }
    }

    pub fn with_mode(mut self, mode: ExpandMode) -> Self {
        self.mode = mode;
        self
    }

    fn expand_value(&self, value: Value, path: &mut Vec<String>) -> Result<Value, ConversionError> {
        match value {
            Value::String(s) => {
                let mut unresolved = None;
                let expanded = expand_str(&s, |name| {
                    let found = self.env.lookup(name);
                    if found.is_none() && unresolved.is_none() {
                        unresolved = Some(name.to_string());
                    }
                    found
                });
                if let Some(name) = unresolved {
                    let at = path.join(".");
                    if self.mode == ExpandMode::Strict {
                        return Err(ConversionError::UnresolvedVariable { name, path: at });
                    }
                    debug!(variable = %name, path = %at, "Leaving unresolved variable reference");
                }
                Ok(Value::String(expanded))
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (i, item) in items.into_iter().enumerate() {
                    path.push(i.to_string());
                    let expanded = self.expand_value(item, path);
                    path.pop();
                    out.push(expanded?);
                }
                Ok(Value::Array(out))
            }
            Value::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (key, item) in map {
                    path.push(key.clone());
                    let expanded = self.expand_value(item, path);
                    path.pop();
                    out.insert(key, expanded?);
                }
                Ok(Value::Object(out))
            }
            other => Ok(other),
        }
    }
}

impl Converter for ExpandConverter {
    fn name(&self) -> &'static str {
        "expand"
    }

    fn apply(&self, tree: Value) -> Result<Value, ConversionError> {
        self.expand_value(tree, &mut Vec::new())
    }
}

/// Replace `${NAME}` placeholders using `lookup`.
///
/// Unresolvable and malformed placeholders are left as-is.
pub fn expand_str(input: &str, mut lookup: impl FnMut(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                var_name.push(c);
            }
            if closed && !var_name.is_empty() {
                match lookup(&var_name) {
                    Some(val) => result.push_str(&val),
                    None => {
                        result.push_str("${");
                        result.push_str(&var_name);
                        result.push('}');
                    }
                }
            } else {
                result.push_str("${");
                result.push_str(&var_name);
                if closed {
                    result.push('}');
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}
