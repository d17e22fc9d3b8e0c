//! Start-up assembly of the collector's [`ConfigProvider`].

use super::config_provider::ConfigProvider;
use super::converter::{ConverterChain, ExpandMode};
use super::env::EnvLookup;
use super::location::{Location, resolve_locations};
use super::provider::ProviderRegistry;
use super::settings::ConfigProviderSettings;
use crate::error::{ResolveError, ResolveResult};
use std::sync::Arc;
use tracing::debug;

/// Default configuration file when no `--config` is given.
pub const DEFAULT_CONFIG_LOCATION: &str = "/opt/aws/aws-otel-collector/etc/config.yaml";

/// Command-line inputs that shape configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigFlags {
    /// `--config` values, in the order given.
    pub locations: Vec<String>,
    /// `--set key=value` values, in the order given.
    pub set: Vec<String>,
    pub expand_mode: ExpandMode,
}

impl ConfigFlags {
    pub fn new(locations: Vec<String>) -> Self {
        Self {
            locations,
            ..Self::default()
        }
    }

    pub fn with_set(mut self, set: Vec<String>) -> Self {
        self.set = set;
        self
    }

    pub fn with_expand_mode(mut self, mode: ExpandMode) -> Self {
        self.expand_mode = mode;
        self
    }
}

/// Build the settings: resolve locations against `env`, register the
/// standard providers and the expand-then-overwrite converter chain.
pub fn config_provider_settings(flags: &ConfigFlags, env: Arc<dyn EnvLookup>) -> ConfigProviderSettings {
    let cli_locations = flags.locations.iter().map(|raw| Location::parse(raw)).collect();
    let locations = resolve_locations(cli_locations, env.as_ref());
    debug!(
        locations = ?locations.iter().map(ToString::to_string).collect::<Vec<_>>(),
        overrides = flags.set.len(),
        "Assembling config provider"
    );
    ConfigProviderSettings::new(
        locations,
        ProviderRegistry::standard(Arc::clone(&env)),
        ConverterChain::standard(env, flags.expand_mode, flags.set.clone()),
    )
}

/// Assemble and validate the collector's config provider.
///
/// Any failure is returned as [`ResolveError::ProviderConstruction`]; callers
/// treat it as fatal.
pub fn build_config_provider(
    flags: &ConfigFlags,
    env: Arc<dyn EnvLookup>,
) -> ResolveResult<ConfigProvider> {
    let provider = ConfigProvider::new(config_provider_settings(flags, env));
    provider.validate().map_err(ResolveError::construction)?;
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::location::CONFIG_CONTENT_ENV;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Arc<dyn EnvLookup> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Arc::new(map)
    }

    #[test]
    fn test_settings_use_standard_components() {
        let flags = ConfigFlags::new(vec!["/etc/otel.yaml".to_string()]);
        let settings = config_provider_settings(&flags, env(&[]));
        assert_eq!(settings.locations(), [Location::new("file", "/etc/otel.yaml")]);
        assert_eq!(settings.providers().schemes(), ["file", "env", "yaml"]);
        assert_eq!(settings.converters().names(), ["expand", "overwrite"]);
    }

    #[test]
    fn test_env_content_replaces_flags() {
        let flags = ConfigFlags::new(vec!["file:/a.yaml".to_string(), "foo:bar".to_string()]);
        let provider = build_config_provider(&flags, env(&[(CONFIG_CONTENT_ENV, "x: 1")])).unwrap();
        assert_eq!(provider.locations(), [Location::env(CONFIG_CONTENT_ENV)]);
    }

    #[test]
    fn test_unknown_scheme_is_construction_error() {
        let flags = ConfigFlags::new(vec!["foo:bar".to_string()]);
        let err = build_config_provider(&flags, env(&[])).err().unwrap();
        assert!(matches!(err, ResolveError::ProviderConstruction(_)));
        assert!(matches!(err.root(), ResolveError::UnknownScheme { .. }));
    }
}
