//! End-to-end configuration resolution through the public factory.

use aot_collector::config::{
    CONFIG_CONTENT_ENV, ConfigFlags, EnvLookup, ExpandMode, ProviderState, build_config_provider,
};
use aot_collector::error::{ConversionError, ProviderError, ResolveError};
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn env(vars: &[(&str, &str)]) -> Arc<dyn EnvLookup> {
    Arc::new(
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    )
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

fn flags(locations: &[String]) -> ConfigFlags {
    ConfigFlags::new(locations.to_vec())
}

#[tokio::test]
async fn test_later_files_override_earlier() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.yaml", "x: 1\ny: 1\n");
    let b = write(&dir, "b.yaml", "y: 2\nz: 2\n");

    let provider =
        build_config_provider(&flags(&[format!("file:{a}"), format!("file:{b}")]), env(&[]))
            .unwrap();
    assert_eq!(provider.state(), ProviderState::Unresolved);

    let config = provider.get().await.unwrap();
    assert_eq!(config.as_value(), &json!({"x": 1, "y": 2, "z": 2}));
    assert_eq!(provider.state(), ProviderState::Resolved);
}

#[tokio::test]
async fn test_nested_sections_merge() {
    let dir = TempDir::new().unwrap();
    let base = write(
        &dir,
        "base.yaml",
        "exporters:\n  logging:\n    loglevel: info\n  awsxray:\n    region: us-west-2\n",
    );
    let overlay = write(&dir, "overlay.yaml", "exporters:\n  logging:\n    loglevel: debug\n");

    let provider = build_config_provider(&flags(&[base, overlay]), env(&[])).unwrap();
    let config = provider.get().await.unwrap();
    assert_eq!(config.get_str("exporters.logging.loglevel"), Some("debug"));
    assert_eq!(config.get_str("exporters.awsxray.region"), Some("us-west-2"));
}

#[tokio::test]
async fn test_content_env_replaces_cli_locations() {
    let vars = env(&[(CONFIG_CONTENT_ENV, "receivers:\n  otlp: {}\n")]);
    // The CLI location does not exist; it must never be read.
    let provider =
        build_config_provider(&flags(&["/nonexistent/a.yaml".to_string()]), vars).unwrap();

    let config = provider.get().await.unwrap();
    assert_eq!(config.as_value(), &json!({"receivers": {"otlp": {}}}));
    assert_eq!(config.locations().len(), 1);
    assert_eq!(config.locations()[0].scheme(), "env");
}

#[tokio::test]
async fn test_unknown_scheme() {
    let provider = aot_collector::config::ConfigProvider::new(
        aot_collector::config::config_provider_settings(
            &flags(&["foo:bar".to_string()]),
            env(&[]),
        ),
    );
    let err = provider.get().await.unwrap_err();
    assert!(
        matches!(err, ResolveError::UnknownScheme { ref scheme, .. } if scheme == "foo"),
        "{err:?}"
    );

    // Through the factory the same failure is a construction error.
    let err = build_config_provider(&flags(&["foo:bar".to_string()]), env(&[])).unwrap_err();
    assert!(matches!(err, ResolveError::ProviderConstruction(_)));
    assert!(matches!(err.root(), ResolveError::UnknownScheme { .. }));
}

#[tokio::test]
async fn test_missing_file_is_not_found() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("missing.yaml").display().to_string();
    let provider = build_config_provider(&flags(&[missing]), env(&[])).unwrap();

    let err = provider.get().await.unwrap_err();
    assert!(
        matches!(
            err,
            ResolveError::Provider {
                source: ProviderError::NotFound { .. },
                ..
            }
        ),
        "{err:?}"
    );
    assert_eq!(provider.state(), ProviderState::Unresolved);
}

#[tokio::test]
async fn test_unset_variable_left_literal() {
    let provider = build_config_provider(
        &flags(&["yaml:endpoint: ${UNSET}".to_string()]),
        env(&[]),
    )
    .unwrap();
    let config = provider.get().await.unwrap();
    assert_eq!(config.get_str("endpoint"), Some("${UNSET}"));
}

#[tokio::test]
async fn test_strict_expansion_reports_variable() {
    let provider = build_config_provider(
        &flags(&["yaml:a:\n  endpoint: ${UNSET}".to_string()])
            .with_expand_mode(ExpandMode::Strict),
        env(&[]),
    )
    .unwrap();
    let err = provider.get().await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Conversion(ConversionError::UnresolvedVariable { ref name, .. }) if name == "UNSET"
    ));
}

#[tokio::test]
async fn test_variable_expansion_and_override() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "config.yaml",
        "exporters:\n  awsxray:\n    region: ${AWS_REGION}\n    endpoint: https://${HOST}:443\n",
    );
    let vars = env(&[("AWS_REGION", "eu-west-1"), ("HOST", "xray.local")]);

    let provider = build_config_provider(
        &flags(&[path]).with_set(vec!["exporters.awsxray.region=us-east-1".to_string()]),
        vars,
    )
    .unwrap();
    let config = provider.get().await.unwrap();
    assert_eq!(config.get_str("exporters.awsxray.region"), Some("us-east-1"));
    assert_eq!(
        config.get_str("exporters.awsxray.endpoint"),
        Some("https://xray.local:443")
    );
}

#[tokio::test]
async fn test_bare_path_is_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "config.yaml", "service:\n  pipelines: {}\n");
    assert!(Path::new(&path).is_absolute());

    let provider = build_config_provider(&flags(&[path]), env(&[])).unwrap();
    let config = provider.get().await.unwrap();
    assert!(config.contains("service.pipelines"));
    assert_eq!(config.locations()[0].scheme(), "file");
}

#[tokio::test]
async fn test_malformed_override_surfaces_from_get() {
    let provider = build_config_provider(
        &flags(&["yaml:a: 1".to_string()]).with_set(vec!["novalue".to_string()]),
        env(&[]),
    )
    .unwrap();
    let err = provider.get().await.unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Conversion(ConversionError::MalformedAssignment(_))
    ));
}

#[tokio::test]
async fn test_non_mapping_document_rejected() {
    let provider =
        build_config_provider(&flags(&["yaml:- a\n- b".to_string()]), env(&[])).unwrap();
    let err = provider.get().await.unwrap_err();
    assert!(matches!(err, ResolveError::InvalidDocument { .. }), "{err:?}");
}

#[tokio::test]
async fn test_closed_provider_refuses_get() {
    let provider = build_config_provider(&flags(&["yaml:a: 1".to_string()]), env(&[])).unwrap();
    provider.get().await.unwrap();
    provider.close();
    provider.close();
    assert!(matches!(provider.get().await, Err(ResolveError::Closed)));
    // The last good configuration is still readable.
    assert!(provider.last_resolved().is_some());
}

#[tokio::test]
async fn test_inline_yaml_overrides_nested_key() {
    let provider = build_config_provider(
        &flags(&["yaml:a: {b: 1}".to_string(), "yaml:a::b: 2".to_string()]),
        env(&[]),
    )
    .unwrap();
    let config = provider.get().await.unwrap();
    assert_eq!(config.as_value(), &json!({"a": {"b": 2}}));
}

#[tokio::test]
async fn test_inline_yaml_merges_over_file() {
    let dir = TempDir::new().unwrap();
    let path = write(
        &dir,
        "config.yaml",
        "exporters:\n  logging:\n    loglevel: info\n    sampling_initial: 5\n",
    );

    let provider = build_config_provider(
        &flags(&[path.clone(), "yaml:exporters::logging::loglevel: debug".to_string()]),
        env(&[]),
    )
    .unwrap();
    let config = provider.get().await.unwrap();
    assert_eq!(config.get_str("exporters.logging.loglevel"), Some("debug"));
    assert_eq!(
        config.get("exporters.logging.sampling_initial"),
        Some(&json!(5))
    );

    // Order decides: the file given last wins over the inline value.
    let provider = build_config_provider(
        &flags(&["yaml:exporters::logging::loglevel: debug".to_string(), path]),
        env(&[]),
    )
    .unwrap();
    let config = provider.get().await.unwrap();
    assert_eq!(config.get_str("exporters.logging.loglevel"), Some("info"));
}
