//! Configuration resolution.
//!
//! Resolves the collector configuration from an ordered list of locations:
//! 1. **Locations** - `--config` values, or `env:AOT_CONFIG_CONTENT` when that
//!    variable is present
//! 2. **Providers** - the location's scheme (`file:`, `env:`, `yaml:`) picks
//!    the provider that reads it
//! 3. **Merge** - fragments are deep-merged, later locations win
//! 4. **Converters** - `${VAR}` expansion, then `--set` overrides
//!
//! ## Environment Variables
//! - `AOT_CONFIG_CONTENT` - Complete configuration text (overrides all locations)

pub mod converter;
pub mod provider;
pub mod watcher;

mod config_provider;
mod env;
mod factory;
mod location;
mod merge;
mod resolved;
mod settings;

pub use config_provider::{ChangeStream, ConfigProvider, ProviderState};
pub use converter::{Converter, ConverterChain, ExpandConverter, ExpandMode, OverwriteConverter};
pub use env::{EnvLookup, ProcessEnv};
pub use factory::{
    ConfigFlags, DEFAULT_CONFIG_LOCATION, build_config_provider, config_provider_settings,
};
pub use location::{CONFIG_CONTENT_ENV, DEFAULT_SCHEME, Location, resolve_locations};
pub use merge::{deep_merge, deep_merge_all, merge_into};
pub use provider::{EnvProvider, FileProvider, ProviderRegistry, SourceProvider, YamlProvider};
pub use resolved::ResolvedConfig;
pub use settings::ConfigProviderSettings;
