//! The resolved-configuration source exposed to the rest of the process.
//!
//! A [`ConfigProvider`] starts `Unresolved`. Each successful [`get`] merges
//! every location into a fresh accumulator, runs the converter chain and
//! moves the provider to `Resolved`. A failed `get` leaves the previous state
//! untouched, so a half-merged configuration is never published.
//!
//! [`get`]: ConfigProvider::get

use super::location::Location;
use super::merge::merge_into;
use super::provider::{ChangeNotifier, WatchGuard};
use super::resolved::ResolvedConfig;
use super::settings::ConfigProviderSettings;
use crate::error::{ResolveError, ResolveResult};
use arc_swap::ArcSwapOption;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

/// Whether a provider has produced a configuration yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    Unresolved,
    Resolved,
}

/// Payload-free "configuration may have changed" signals.
///
/// Call [`ConfigProvider::get`] again after each signal to obtain the new
/// configuration.
#[derive(Debug)]
pub struct ChangeStream {
    rx: mpsc::Receiver<()>,
    closed: watch::Receiver<bool>,
}

impl ChangeStream {
    /// Wait for the next change signal.
    ///
    /// Returns `false` once the provider is closed or dropped; the stream
    /// cannot be restarted after that.
    pub async fn changed(&mut self) -> bool {
        if *self.closed.borrow() {
            return false;
        }
        tokio::select! {
            biased;
            _ = self.closed.wait_for(|closed| *closed) => false,
            signal = self.rx.recv() => signal.is_some(),
        }
    }
}

struct ActiveWatch {
    _guards: Vec<WatchGuard>,
    _notifier: ChangeNotifier,
    closed_tx: watch::Sender<bool>,
}

enum WatchSlot {
    Available,
    Active(ActiveWatch),
    Closed,
}

/// Configuration source bound to a fixed set of locations, providers and
/// converters.
pub struct ConfigProvider {
    settings: ConfigProviderSettings,
    last: ArcSwapOption<ResolvedConfig>,
    watch: Mutex<WatchSlot>,
    closed: AtomicBool,
}

impl ConfigProvider {
    pub fn new(settings: ConfigProviderSettings) -> Self {
        Self {
            settings,
            last: ArcSwapOption::empty(),
            watch: Mutex::new(WatchSlot::Available),
            closed: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &ConfigProviderSettings {
        &self.settings
    }

    pub fn locations(&self) -> &[Location] {
        self.settings.locations()
    }

    pub fn state(&self) -> ProviderState {
        if self.last.load().is_some() {
            ProviderState::Resolved
        } else {
            ProviderState::Unresolved
        }
    }

    /// Configuration from the last successful [`get`](Self::get).
    pub fn last_resolved(&self) -> Option<Arc<ResolvedConfig>> {
        self.last.load_full()
    }

    /// Check that every location's scheme has a registered provider, without
    /// retrieving anything.
    pub fn validate(&self) -> ResolveResult<()> {
        for location in self.settings.locations() {
            self.settings.providers().lookup(location)?;
        }
        Ok(())
    }

    /// Resolve every location, merge in order and run the converter chain.
    pub async fn get(&self) -> ResolveResult<Arc<ResolvedConfig>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(ResolveError::Closed);
        }
        let locations = self.settings.locations();
        if locations.is_empty() {
            return Err(ResolveError::NoLocations);
        }
        self.validate()?;

        let mut merged = Map::new();
        for location in locations {
            let provider = self.settings.providers().lookup(location)?;
            let retrieved = provider
                .retrieve(location.identifier())
                .await
                .map_err(|source| ResolveError::Provider {
                    location: location.to_string(),
                    source,
                })?;
            let fragment = parse_fragment(location, retrieved.as_bytes())?;
            debug!(location = %location, keys = fragment.len(), "Merged configuration fragment");
            merge_into(&mut merged, fragment);
        }

        let tree = self.settings.converters().apply(Value::Object(merged))?;
        let resolved = Arc::new(ResolvedConfig::new(tree, locations.to_vec()));
        self.last.store(Some(Arc::clone(&resolved)));
        info!(locations = locations.len(), "Configuration resolved");
        Ok(resolved)
    }

    /// [`get`](Self::get) bounded by `timeout`.
    pub async fn get_with_timeout(&self, timeout: Duration) -> ResolveResult<Arc<ResolvedConfig>> {
        tokio::time::timeout(timeout, self.get())
            .await
            .map_err(|_| ResolveError::Timeout(timeout))?
    }

    /// Start change detection on every watchable location.
    ///
    /// Can be taken once. Locations whose provider cannot watch never signal;
    /// a provider that fails to set up its watch is logged and skipped.
    pub fn watch(&self) -> ResolveResult<ChangeStream> {
        let mut slot = self.lock_watch();
        match *slot {
            WatchSlot::Available => {}
            WatchSlot::Active(_) => {
                return Err(ResolveError::WatchUnavailable("watch stream already taken"));
            }
            WatchSlot::Closed => return Err(ResolveError::WatchUnavailable("provider is closed")),
        }
        self.validate()?;

        let (tx, rx) = mpsc::channel(1);
        let notifier = ChangeNotifier::new(tx);
        let (closed_tx, closed_rx) = watch::channel(false);

        let mut guards = Vec::new();
        for location in self.settings.locations() {
            let provider = self.settings.providers().lookup(location)?;
            match provider.watch(location.identifier(), notifier.clone()) {
                Ok(Some(guard)) => guards.push(guard),
                Ok(None) => debug!(location = %location, "Location does not support change detection"),
                Err(e) => warn!(location = %location, error = %e, "Continuing without change detection"),
            }
        }

        *slot = WatchSlot::Active(ActiveWatch {
            _guards: guards,
            _notifier: notifier,
            closed_tx,
        });
        Ok(ChangeStream {
            rx,
            closed: closed_rx,
        })
    }

    /// Release watch resources and end any outstanding [`ChangeStream`].
    ///
    /// Safe to call more than once.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let previous = std::mem::replace(&mut *self.lock_watch(), WatchSlot::Closed);
        if let WatchSlot::Active(active) = previous {
            let _ = active.closed_tx.send(true);
        }
        debug!("Config provider closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock_watch(&self) -> MutexGuard<'_, WatchSlot> {
        self.watch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigProvider")
            .field("settings", &self.settings)
            .field("state", &self.state())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Parse one retrieved document into a mapping.
///
/// Empty and comment-only documents count as an empty mapping. YAML merge
/// keys (`<<`) are applied.
fn parse_fragment(location: &Location, raw: &[u8]) -> ResolveResult<Map<String, Value>> {
    let mut yaml: serde_yaml::Value =
        serde_yaml::from_slice(raw).map_err(|source| ResolveError::Parse {
            location: location.to_string(),
            source,
        })?;
    yaml.apply_merge().map_err(|source| ResolveError::Parse {
        location: location.to_string(),
        source,
    })?;
    let tree = serde_json::to_value(yaml).map_err(|source| ResolveError::UnsupportedValue {
        location: location.to_string(),
        source,
    })?;
    match tree {
        Value::Null => Ok(Map::new()),
        Value::Object(map) => Ok(map),
        _ => Err(ResolveError::InvalidDocument {
            location: location.to_string(),
        }),
    }
}
