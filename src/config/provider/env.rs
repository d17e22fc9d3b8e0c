use super::{Retrieved, SourceProvider};
use crate::config::env::{EnvLookup, ProcessEnv};
use crate::error::ProviderError;
use async_trait::async_trait;
use std::sync::Arc;

/// Reads configuration content from an environment variable (`env:NAME`).
///
/// Environment variables cannot be watched, so this provider never signals.
pub struct EnvProvider {
    env: Arc<dyn EnvLookup>,
}

impl EnvProvider {
    pub const SCHEME: &'static str = "env";

    pub fn new(env: Arc<dyn EnvLookup>) -> Self {
        Self { env }
    }

    /// Provider backed by the process environment.
    pub fn from_process() -> Self {
        Self::new(Arc::new(ProcessEnv))
    }
}

#[async_trait]
impl SourceProvider for EnvProvider {
    fn scheme(&self) -> &str {
        Self::SCHEME
    }

    async fn retrieve(&self, identifier: &str) -> Result<Retrieved, ProviderError> {
        self.env
            .lookup(identifier)
            .map(Retrieved::new)
            .ok_or_else(|| ProviderError::not_found(Self::SCHEME, identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn provider(vars: &[(&str, &str)]) -> EnvProvider {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EnvProvider::new(Arc::new(map))
    }

    #[tokio::test]
    async fn test_retrieve_set_variable() {
        let p = provider(&[("AOT_CONFIG_CONTENT", "x: 1")]);
        let got = p.retrieve("AOT_CONFIG_CONTENT").await.unwrap();
        assert_eq!(got.as_bytes(), b"x: 1");
    }

    #[tokio::test]
    async fn test_retrieve_empty_variable() {
        let p = provider(&[("EMPTY", "")]);
        assert!(p.retrieve("EMPTY").await.unwrap().as_bytes().is_empty());
    }

    #[tokio::test]
    async fn test_retrieve_unset_variable() {
        let p = provider(&[]);
        let err = p.retrieve("MISSING").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound { .. }));
    }
}
