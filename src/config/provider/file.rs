use super::{ChangeNotifier, Retrieved, SourceProvider, WatchGuard};
use crate::config::watcher::{WatcherConfig, watch_file};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads configuration from a file on disk (`file:/etc/otel/config.yaml`).
///
/// Supports change detection through a debounced filesystem watch.
#[derive(Debug, Default, Clone)]
pub struct FileProvider {
    watcher: WatcherConfig,
}

impl FileProvider {
    pub const SCHEME: &'static str = "file";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_watcher_config(mut self, watcher: WatcherConfig) -> Self {
        self.watcher = watcher;
        self
    }
}

#[async_trait]
impl SourceProvider for FileProvider {
    fn scheme(&self) -> &str {
        Self::SCHEME
    }

    async fn retrieve(&self, identifier: &str) -> Result<Retrieved, ProviderError> {
        let path = Path::new(identifier);
        match tokio::fs::read(path).await {
            Ok(raw) => Ok(Retrieved::new(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ProviderError::not_found(Self::SCHEME, identifier))
            }
            Err(source) => Err(ProviderError::Io {
                path: PathBuf::from(identifier),
                source,
            }),
        }
    }

    fn watch(
        &self,
        identifier: &str,
        notifier: ChangeNotifier,
    ) -> Result<Option<WatchGuard>, ProviderError> {
        let watch = watch_file(Path::new(identifier), &self.watcher, notifier).map_err(|source| {
            ProviderError::Watch {
                identifier: identifier.to_string(),
                source,
            }
        })?;
        Ok(Some(WatchGuard::new(watch)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_retrieve_existing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.yaml");
        std::fs::write(&path, "x: 1\n").unwrap();

        let got = FileProvider::new()
            .retrieve(path.to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(got.as_bytes(), b"x: 1\n");
    }

    #[tokio::test]
    async fn test_retrieve_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.yaml");
        let err = FileProvider::new()
            .retrieve(path.to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_retrieve_directory_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = FileProvider::new()
            .retrieve(temp.path().to_str().unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Io { .. }));
    }
}
