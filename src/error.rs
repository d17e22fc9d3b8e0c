//! Error types for configuration resolution.
//!
//! Every resolution failure is fatal at startup. The one deliberate leniency,
//! unresolved `${VAR}` references, never produces an error here unless strict
//! expansion was requested.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a [`SourceProvider`](crate::config::provider::SourceProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The identifier does not name anything this provider can read.
    #[error("{scheme}: {identifier} not found")]
    NotFound { scheme: String, identifier: String },

    /// Reading the identifier failed for another reason.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Registering a change watch failed.
    #[error("failed to watch {identifier}: {source}")]
    Watch {
        identifier: String,
        #[source]
        source: notify::Error,
    },
}

impl ProviderError {
    pub fn not_found(scheme: &str, identifier: &str) -> Self {
        Self::NotFound {
            scheme: scheme.to_string(),
            identifier: identifier.to_string(),
        }
    }
}

/// Errors raised by a [`Converter`](crate::config::converter::Converter).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// A `--set` assignment had no `=`.
    #[error("malformed property assignment {0:?}: expected key=value")]
    MalformedAssignment(String),

    /// A dotted key path was empty or had an empty segment.
    #[error("invalid key path {0:?}")]
    InvalidKeyPath(String),

    /// Strict expansion found a reference to an unset variable.
    #[error("unresolved variable ${{{name}}} at {path}")]
    UnresolvedVariable { name: String, path: String },
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The location's scheme has no registered provider.
    #[error("unknown scheme {scheme:?} in location {location}")]
    UnknownScheme { scheme: String, location: String },

    /// A provider could not retrieve its identifier.
    #[error("retrieving {location}: {source}")]
    Provider {
        location: String,
        #[source]
        source: ProviderError,
    },

    /// Retrieved content was not valid YAML.
    #[error("parsing {location}: {source}")]
    Parse {
        location: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Retrieved content holds YAML with no configuration-tree equivalent,
    /// such as a null or sequence mapping key.
    #[error("converting {location}: {source}")]
    UnsupportedValue {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    /// Retrieved content parsed, but its top level is not a mapping.
    #[error("{location} does not contain a mapping at the top level")]
    InvalidDocument { location: String },

    /// A converter rejected the merged tree.
    #[error("converting configuration: {0}")]
    Conversion(#[from] ConversionError),

    /// There was nothing to resolve.
    #[error("no configuration locations given")]
    NoLocations,

    /// The provider was closed.
    #[error("config provider is closed")]
    Closed,

    /// `watch()` was already taken, or the provider is closed.
    #[error("watch stream is unavailable: {0}")]
    WatchUnavailable(&'static str),

    /// `get_with_timeout` elapsed.
    #[error("resolving configuration timed out after {0:?}")]
    Timeout(Duration),

    /// Wrapper for any of the above during initial assembly.
    #[error("failed to construct config provider: {0}")]
    ProviderConstruction(#[source] Box<ResolveError>),
}

impl ResolveError {
    /// Wrap an error raised during startup assembly.
    pub fn construction(err: ResolveError) -> Self {
        match err {
            already @ ResolveError::ProviderConstruction(_) => already,
            other => ResolveError::ProviderConstruction(Box::new(other)),
        }
    }

    /// The innermost error, looking through `ProviderConstruction`.
    pub fn root(&self) -> &ResolveError {
        match self {
            ResolveError::ProviderConstruction(inner) => inner.root(),
            other => other,
        }
    }
}

/// Result type for resolution operations.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
