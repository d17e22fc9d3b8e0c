//! The collector service boundary.
//!
//! The pipeline engine is represented by a callback that receives each newly
//! resolved configuration. The service owns the [`ConfigProvider`] and closes
//! it when it stops.

use crate::components::Factories;
use crate::config::{ConfigProvider, ResolvedConfig};
use crate::error::ResolveError;
use crate::logging::LoggingHook;
use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info};

/// Identity of the running binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationStartInfo {
    pub exe_name: String,
    pub long_name: String,
    pub version: String,
    pub git_hash: String,
}

impl ApplicationStartInfo {
    pub fn collector() -> Self {
        Self {
            exe_name: "aws-otel-collector".to_string(),
            long_name: "AWS OTel Collector".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        }
    }
}

/// Everything the service needs at start.
pub struct ServiceParameters {
    pub factories: Factories,
    pub start_info: ApplicationStartInfo,
    pub config_provider: ConfigProvider,
    pub logging_hooks: Vec<LoggingHook>,
}

pub struct Service {
    params: ServiceParameters,
}

impl Service {
    pub fn new(params: ServiceParameters) -> Self {
        Self { params }
    }

    pub fn start_info(&self) -> &ApplicationStartInfo {
        &self.params.start_info
    }

    pub fn factories(&self) -> &Factories {
        &self.params.factories
    }

    pub fn logging_hooks(&self) -> &[LoggingHook] {
        &self.params.logging_hooks
    }

    pub fn config_provider(&self) -> &ConfigProvider {
        &self.params.config_provider
    }

    /// Initial resolution. Any failure is a construction error.
    pub async fn resolve_initial(&self) -> Result<Arc<ResolvedConfig>, ResolveError> {
        self.params
            .config_provider
            .get()
            .await
            .map_err(ResolveError::construction)
    }

    /// Resolve, hand the configuration to `apply`, and if `watch` is set keep
    /// re-resolving on change until `shutdown` completes or the change stream
    /// ends. The config provider is closed on return.
    ///
    /// A failed reload is logged and the previous configuration stays active.
    pub async fn run<F, S>(self, watch: bool, mut apply: F, shutdown: S) -> Result<()>
    where
        F: FnMut(Arc<ResolvedConfig>) -> Result<()>,
        S: Future<Output = ()>,
    {
        let info = &self.params.start_info;
        info!(
            version = %info.version,
            git_hash = %info.git_hash,
            components = self.params.factories.len(),
            hooks = self.params.logging_hooks.len(),
            "Starting {}",
            info.long_name
        );

        let provider = &self.params.config_provider;
        tokio::pin!(shutdown);
        let result: Result<()> = async {
            let config = self.resolve_initial().await?;
            apply(config).context("failed to apply initial configuration")?;

            if !watch {
                return Ok(());
            }
            let mut changes = provider.watch()?;
            loop {
                tokio::select! {
                    _ = &mut shutdown => {
                        info!("Shutdown requested");
                        break;
                    }
                    changed = changes.changed() => {
                        if !changed {
                            break;
                        }
                        match provider.get().await {
                            Ok(config) => {
                                info!("Configuration reloaded");
                                if let Err(e) = apply(config) {
                                    error!(error = %e, "Failed to apply reloaded configuration");
                                }
                            }
                            Err(e) => error!(error = %e, "Failed to reload configuration"),
                        }
                    }
                }
            }
            Ok::<(), anyhow::Error>(())
        }
        .await;

        provider.close();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFlags, build_config_provider};
    use std::collections::HashMap;

    fn service(locations: &[&str]) -> Service {
        let env: Arc<dyn crate::config::EnvLookup> = Arc::new(HashMap::<String, String>::new());
        let flags = ConfigFlags::new(locations.iter().map(|s| s.to_string()).collect());
        Service::new(ServiceParameters {
            factories: Factories::default(),
            start_info: ApplicationStartInfo::collector(),
            config_provider: build_config_provider(&flags, env).unwrap(),
            logging_hooks: Vec::new(),
        })
    }

    #[test]
    fn test_start_info() {
        let info = ApplicationStartInfo::collector();
        assert_eq!(info.exe_name, "aws-otel-collector");
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_run_once_applies_and_closes() {
        let svc = service(&["yaml:a: 1", "yaml:b: 2"]);
        let mut seen = Vec::new();
        svc.run(
            false,
            |cfg| {
                seen.push(cfg.as_value().clone());
                Ok(())
            },
            std::future::pending(),
        )
        .await
        .unwrap();
        assert_eq!(seen, vec![serde_json::json!({"a": 1, "b": 2})]);
    }

    #[tokio::test]
    async fn test_run_fails_on_initial_error() {
        let svc = service(&["yaml:a: [broken"]);
        let err = svc
            .run(false, |_| Ok(()), std::future::pending())
            .await
            .unwrap_err();
        let resolve = err.downcast_ref::<ResolveError>().unwrap();
        assert!(matches!(resolve, ResolveError::ProviderConstruction(_)));
    }

    #[tokio::test]
    async fn test_watch_stops_on_shutdown() {
        let svc = service(&["yaml:a: 1"]);
        let mut applied = 0;
        svc.run(
            true,
            |_| {
                applied += 1;
                Ok(())
            },
            async {},
        )
        .await
        .unwrap();
        assert_eq!(applied, 1);
    }
}
