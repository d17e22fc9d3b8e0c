//! Log output for the collector process.
//!
//! One size-rotating file writer is shared by:
//! - the structured log hook fed from `tracing` ([`HookLayer`])
//! - the process-wide unstructured error log ([`error_log`])
//!
//! The writer is created once and lives for the rest of the process.

pub mod error_log;
mod hook;
mod rotation;

pub use error_log::{error_log_writer, log_error, setup_error_logger};
pub use hook::{HookLayer, LogEntry, LoggingHook};
pub use rotation::{RotatingWriter, RotationOptions};

use anyhow::Result;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default location of the collector log file.
pub const DEFAULT_LOG_FILE: &str = "/opt/aws/aws-otel-collector/logs/aws-otel-collector.log";

static LOG_WRITER: OnceLock<Arc<RotatingWriter>> = OnceLock::new();

/// The process-wide rotating writer, created on first call.
///
/// Later calls return the same instance; asking for a different path then
/// only logs a warning.
pub fn init_log_writer(path: impl AsRef<Path>) -> Arc<RotatingWriter> {
    let path = path.as_ref();
    let writer = LOG_WRITER.get_or_init(|| Arc::new(RotatingWriter::new(path)));
    if writer.path() != path {
        warn!(
            requested = %path.display(),
            active = %writer.path().display(),
            "Log writer already initialized; keeping the existing file"
        );
    }
    Arc::clone(writer)
}

/// The process-wide writer, if it has been created.
pub fn log_writer() -> Option<Arc<RotatingWriter>> {
    LOG_WRITER.get().cloned()
}

/// A hook bound to the process-wide writer at `path`.
pub fn logging_hook(path: impl AsRef<Path>) -> LoggingHook {
    LoggingHook::new(init_log_writer(path))
}

/// Install the global `tracing` subscriber: stderr output filtered by
/// `RUST_LOG` (default `info`, or `debug` when verbose), plus `hooks`.
pub fn init_tracing(verbose: bool, hooks: Vec<LoggingHook>) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(HookLayer::new(hooks))
        .try_init()?;
    Ok(())
}
