//! Post-merge transforms over the configuration tree.
//!
//! Converters run strictly in the order they were added; each receives the
//! output of the previous one. The standard chain is expansion first, then
//! `--set` overrides, so an explicit override always beats an expanded value.

mod expand;
mod overwrite;

pub use expand::{ExpandConverter, ExpandMode, expand_str};
pub use overwrite::{OverwriteConverter, parse_assignment};

use super::env::EnvLookup;
use crate::error::ConversionError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// A transform applied to the merged configuration tree.
pub trait Converter: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    fn apply(&self, tree: Value) -> Result<Value, ConversionError>;
}

/// Ordered list of converters.
#[derive(Clone, Default)]
pub struct ConverterChain {
    converters: Vec<Arc<dyn Converter>>,
}

impl ConverterChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expansion against `env`, then the given `--set` assignments.
    pub fn standard(env: Arc<dyn EnvLookup>, mode: ExpandMode, assignments: Vec<String>) -> Self {
        Self::new()
            .with(ExpandConverter::new(env).with_mode(mode))
            .with(OverwriteConverter::new(assignments))
    }

    /// Append a converter to the end of the chain.
    pub fn with(mut self, converter: impl Converter + 'static) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Names of the converters, in run order.
    pub fn names(&self) -> Vec<&'static str> {
        self.converters.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    pub fn apply(&self, tree: Value) -> Result<Value, ConversionError> {
        self.converters.iter().try_fold(tree, |tree, converter| {
            trace!(converter = converter.name(), "Applying converter");
            converter.apply(tree)
        })
    }
}

impl fmt::Debug for ConverterChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterChain")
            .field("converters", &self.names())
            .finish()
    }
}
