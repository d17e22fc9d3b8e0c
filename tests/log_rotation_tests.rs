//! Rotation under the process-wide subscriber.
//!
//! Installs a global subscriber, so it lives in its own test binary.

use aot_collector::logging::{HookLayer, LoggingHook, RotatingWriter, RotationOptions};
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;
use tempfile::TempDir;
use tracing_subscriber::layer::SubscriberExt;

#[test]
fn test_failed_cleanup_does_not_block_logging() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("collector.log");
    // A directory that looks like a backup, so compressing it fails.
    std::fs::create_dir(dir.path().join("collector-1.log")).unwrap();

    let options = RotationOptions {
        max_size: 300,
        max_backups: 0,
        max_age: Duration::ZERO,
        compress: true,
    };
    let writer = Arc::new(RotatingWriter::with_options(&path, options));
    let subscriber =
        tracing_subscriber::registry().with(HookLayer::new(vec![LoggingHook::new(writer.clone())]));
    tracing::subscriber::set_global_default(subscriber).unwrap();

    let (done_tx, done_rx) = mpsc::channel();
    std::thread::spawn(move || {
        for i in 0..20 {
            tracing::info!(exporter = "awsemf", batch = i, "Exported metrics batch");
        }
        let _ = done_tx.send(());
    });

    done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("logging thread blocked");
    assert!(!writer.backups().unwrap().is_empty());
    assert!(std::fs::read_to_string(&path).unwrap().contains("Exported metrics batch"));
}
