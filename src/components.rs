//! Catalog of pipeline component factories available to the collector.
//!
//! The catalog is opaque to configuration resolution; it is built once at
//! start-up and handed to the service unchanged.

use anyhow::{Result, bail};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of pipeline component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Receiver,
    Processor,
    Exporter,
    Extension,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentKind::Receiver => write!(f, "receiver"),
            ComponentKind::Processor => write!(f, "processor"),
            ComponentKind::Exporter => write!(f, "exporter"),
            ComponentKind::Extension => write!(f, "extension"),
        }
    }
}

/// Registered component type names, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Factories {
    pub receivers: BTreeSet<String>,
    pub processors: BTreeSet<String>,
    pub exporters: BTreeSet<String>,
    pub extensions: BTreeSet<String>,
}

impl Factories {
    /// Register a component type. Registering the same name twice for one kind
    /// is an error.
    pub fn register(&mut self, kind: ComponentKind, name: &str) -> Result<()> {
        let set = match kind {
            ComponentKind::Receiver => &mut self.receivers,
            ComponentKind::Processor => &mut self.processors,
            ComponentKind::Exporter => &mut self.exporters,
            ComponentKind::Extension => &mut self.extensions,
        };
        if !set.insert(name.to_string()) {
            bail!("duplicate {} factory: {}", kind, name);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.receivers.len() + self.processors.len() + self.exporters.len() + self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The components shipped with the collector.
pub fn default_components() -> Result<Factories> {
    let mut factories = Factories::default();
    for name in ["otlp", "awsxray", "awsecscontainermetrics", "prometheus", "statsd"] {
        factories.register(ComponentKind::Receiver, name)?;
    }
    for name in ["batch", "memory_limiter", "resourcedetection", "metricstransform", "filter"] {
        factories.register(ComponentKind::Processor, name)?;
    }
    for name in ["awsxray", "awsemf", "logging", "otlp", "otlphttp", "prometheusremotewrite"] {
        factories.register(ComponentKind::Exporter, name)?;
    }
    for name in ["health_check", "pprof", "zpages", "awsproxy", "ecs_observer", "sigv4auth"] {
        factories.register(ComponentKind::Extension, name)?;
    }
    Ok(factories)
}
