//! Source providers and the scheme-keyed registry.
//!
//! A provider turns the identifier part of a [`Location`] into raw
//! configuration bytes. The location's scheme selects the provider.

mod env;
mod file;
mod yaml;

pub use env::EnvProvider;
pub use file::FileProvider;
pub use yaml::YamlProvider;

use super::env::EnvLookup;
use super::location::Location;
use crate::error::{ProviderError, ResolveError, ResolveResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

/// Raw content returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Retrieved {
    raw: Vec<u8>,
}

impl Retrieved {
    pub fn new(raw: impl Into<Vec<u8>>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.raw
    }
}

/// Sending half of a watch stream. Signals coalesce: if one is already
/// pending, further signals are dropped.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: mpsc::Sender<()>,
}

impl ChangeNotifier {
    pub(crate) fn new(tx: mpsc::Sender<()>) -> Self {
        Self { tx }
    }

    /// Signal that configuration may have changed.
    ///
    /// Returns `false` once the receiving side is gone.
    pub fn notify(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

/// Keeps a provider's watch resources alive. Dropping it stops the watch.
pub struct WatchGuard {
    _inner: Box<dyn Send>,
}

impl WatchGuard {
    pub fn new(inner: impl Send + 'static) -> Self {
        Self {
            _inner: Box::new(inner),
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard").finish_non_exhaustive()
    }
}

/// Resolves the identifier part of a location to raw configuration content.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    /// Scheme prefix this provider serves, without the trailing `:`.
    fn scheme(&self) -> &str;

    /// Read the content named by `identifier`.
    async fn retrieve(&self, identifier: &str) -> Result<Retrieved, ProviderError>;

    /// Start signalling `notifier` when the content behind `identifier` may
    /// have changed. Providers without change detection return `Ok(None)`.
    fn watch(
        &self,
        _identifier: &str,
        _notifier: ChangeNotifier,
    ) -> Result<Option<WatchGuard>, ProviderError> {
        Ok(None)
    }
}

/// Scheme to provider mapping, in registration order.
#[derive(Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn SourceProvider>>,
    order: Vec<String>,
}

impl ProviderRegistry {
    /// Build a registry. On a scheme collision the later provider wins.
    pub fn new(providers: impl IntoIterator<Item = Arc<dyn SourceProvider>>) -> Self {
        let mut registry = Self {
            providers: HashMap::new(),
            order: Vec::new(),
        };
        for provider in providers {
            registry.register(provider);
        }
        registry
    }

    /// The `file`, `env` and `yaml` providers, in that order.
    pub fn standard(env: Arc<dyn EnvLookup>) -> Self {
        Self::new([
            Arc::new(FileProvider::new()) as Arc<dyn SourceProvider>,
            Arc::new(EnvProvider::new(env)),
            Arc::new(YamlProvider::new()),
        ])
    }

    fn register(&mut self, provider: Arc<dyn SourceProvider>) {
        let scheme = provider.scheme().to_string();
        if let Some(first) = self.order.iter().position(|s| *s == scheme) {
            warn!(
                scheme = %scheme,
                first_position = first,
                position = self.order.len(),
                "Provider scheme registered twice; last registration wins"
            );
            self.order.remove(first);
        }
        self.order.push(scheme.clone());
        self.providers.insert(scheme, provider);
    }

    /// Provider for the location's scheme.
    pub fn lookup(&self, location: &Location) -> ResolveResult<&Arc<dyn SourceProvider>> {
        self.providers
            .get(location.scheme())
            .ok_or_else(|| ResolveError::UnknownScheme {
                scheme: location.scheme().to_string(),
                location: location.to_string(),
            })
    }

    /// Registered schemes, oldest surviving registration first.
    pub fn schemes(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("schemes", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct Fixed {
        scheme: &'static str,
        body: &'static str,
    }

    #[async_trait]
    impl SourceProvider for Fixed {
        fn scheme(&self) -> &str {
            self.scheme
        }

        async fn retrieve(&self, _identifier: &str) -> Result<Retrieved, ProviderError> {
            Ok(Retrieved::new(self.body))
        }
    }

    #[test]
    fn test_standard_registry_schemes() {
        let env: Arc<dyn EnvLookup> = Arc::new(HashMap::<String, String>::new());
        let registry = ProviderRegistry::standard(env);
        assert_eq!(registry.schemes(), ["file", "env", "yaml"]);
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let registry = ProviderRegistry::new([
            Arc::new(Fixed { scheme: "mem", body: "first" }) as Arc<dyn SourceProvider>,
            Arc::new(Fixed { scheme: "other", body: "" }),
            Arc::new(Fixed { scheme: "mem", body: "second" }),
        ]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.schemes(), ["other", "mem"]);

        let provider = registry.lookup(&Location::new("mem", "x")).unwrap();
        let retrieved = provider.retrieve("x").await.unwrap();
        assert_eq!(retrieved.as_bytes(), b"second");
    }

    #[test]
    fn test_lookup_unknown_scheme() {
        let registry = ProviderRegistry::new(Vec::new());
        let err = registry.lookup(&Location::parse("foo:bar")).err().unwrap();
        match err {
            ResolveError::UnknownScheme { scheme, location } => {
                assert_eq!(scheme, "foo");
                assert_eq!(location, "foo:bar");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_notifier_coalesces_and_detects_close() {
        let (tx, mut rx) = mpsc::channel(1);
        let notifier = ChangeNotifier::new(tx);
        assert!(notifier.notify());
        assert!(notifier.notify());
        assert_eq!(rx.recv().await, Some(()));
        assert!(rx.try_recv().is_err());
        drop(rx);
        assert!(!notifier.notify());
    }
}
