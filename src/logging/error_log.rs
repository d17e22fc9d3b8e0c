//! Process-wide unstructured error log.
//!
//! Start-up failures and other diagnostics that happen outside `tracing` go
//! here. Until [`setup_error_logger`] runs, lines go to stderr.

use super::init_log_writer;
use super::rotation::RotatingWriter;
use chrono::Utc;
use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

static ERROR_LOG: OnceLock<Arc<RotatingWriter>> = OnceLock::new();

/// Install the shared log writer as the error log destination.
///
/// Only the first call installs anything; later calls, including concurrent
/// ones, return the writer that was installed first.
pub fn setup_error_logger(path: impl AsRef<Path>) -> Arc<RotatingWriter> {
    let writer = init_log_writer(path);
    Arc::clone(ERROR_LOG.get_or_init(|| writer))
}

/// The installed error log writer, if any.
pub fn error_log_writer() -> Option<Arc<RotatingWriter>> {
    ERROR_LOG.get().cloned()
}

/// Write one timestamped line to the error log.
pub fn log_error(message: impl fmt::Display) {
    let line = format!("{} {}\n", Utc::now().format("%Y/%m/%d %H:%M:%S"), message);
    match ERROR_LOG.get() {
        Some(writer) => {
            if let Err(e) = writer.write_record(line.as_bytes()) {
                eprint!("{line}");
                eprintln!("error log write failed: {e}");
            }
        }
        None => eprint!("{line}"),
    }
}
