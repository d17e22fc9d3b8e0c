//! Immutable inputs of a [`ConfigProvider`](super::ConfigProvider).

use super::converter::ConverterChain;
use super::location::Location;
use super::provider::ProviderRegistry;

/// Locations, providers and converters, fixed once the provider is built.
#[derive(Debug, Clone)]
pub struct ConfigProviderSettings {
    locations: Vec<Location>,
    providers: ProviderRegistry,
    converters: ConverterChain,
}

impl ConfigProviderSettings {
    pub fn new(
        locations: Vec<Location>,
        providers: ProviderRegistry,
        converters: ConverterChain,
    ) -> Self {
        Self {
            locations,
            providers,
            converters,
        }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn converters(&self) -> &ConverterChain {
        &self.converters
    }
}
