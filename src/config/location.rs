//! Configuration locations and the `AOT_CONFIG_CONTENT` override.

use super::env::EnvLookup;
use regex_lite::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info};

/// Environment variable whose value, when present, is the entire configuration.
pub const CONFIG_CONTENT_ENV: &str = "AOT_CONFIG_CONTENT";

/// Scheme used for locations without an explicit scheme prefix.
pub const DEFAULT_SCHEME: &str = "file";

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Two characters minimum so Windows drive letters stay paths.
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]+$").expect("valid scheme regex"))
}

/// A `scheme:identifier` pair naming where configuration content comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    scheme: String,
    identifier: String,
}

impl Location {
    pub fn new(scheme: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            identifier: identifier.into(),
        }
    }

    /// Parse a location string. Strings without a valid scheme prefix are
    /// treated as file paths.
    pub fn parse(raw: &str) -> Self {
        if let Some((scheme, identifier)) = raw.split_once(':')
            && scheme_pattern().is_match(scheme)
        {
            return Self::new(scheme, identifier);
        }
        Self::new(DEFAULT_SCHEME, raw)
    }

    /// Synthetic location reading the whole configuration from `var`.
    pub fn env(var: &str) -> Self {
        Self::new("env", var)
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.identifier)
    }
}

impl FromStr for Location {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Decide the ordered list of locations to load.
///
/// If [`CONFIG_CONTENT_ENV`] is present (even empty) the result is exactly
/// `[env:AOT_CONFIG_CONTENT]` and `cli_locations` are discarded. Otherwise
/// `cli_locations` are returned unchanged.
pub fn resolve_locations(cli_locations: Vec<Location>, env: &dyn EnvLookup) -> Vec<Location> {
    match env.lookup(CONFIG_CONTENT_ENV) {
        Some(content) => {
            info!(
                var = CONFIG_CONTENT_ENV,
                bytes = content.len(),
                discarded = cli_locations.len(),
                "Reading AOT config from environment"
            );
            debug!(content = %content, "AOT config content");
            vec![Location::env(CONFIG_CONTENT_ENV)]
        }
        None => cli_locations,
    }
}
