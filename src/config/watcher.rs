//! File watcher for configuration files.
//!
//! Watches the parent directory of a config file (editors often replace files
//! by rename) and signals a [`ChangeNotifier`] whenever an event touches the
//! file. Uses debouncing to coalesce rapid file changes.

use super::provider::ChangeNotifier;
use notify::RecommendedWatcher;
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Configuration for the file watcher.
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Debounce duration for coalescing rapid changes.
    pub debounce_duration: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_duration: Duration::from_millis(500),
        }
    }
}

/// A running watch on one file. Dropping it stops the watch and ends the
/// event thread.
pub struct FileWatch {
    path: PathBuf,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl FileWatch {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileWatch {
    fn drop(&mut self) {
        debug!("Stopping config watch on {}", self.path.display());
    }
}

/// Start watching `path`, signalling `notifier` when it changes.
pub fn watch_file(
    path: &Path,
    config: &WatcherConfig,
    notifier: ChangeNotifier,
) -> Result<FileWatch, notify::Error> {
    let file_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .ok_or_else(|| notify::Error::generic("config path has no file name"))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let (notify_tx, notify_rx) = mpsc::channel();
    let mut debouncer = new_debouncer(config.debounce_duration, notify_tx)?;
    debouncer
        .watcher()
        .watch(&dir, notify::RecursiveMode::NonRecursive)?;
    info!("Watching config file: {}", path.display());

    let shown = path.display().to_string();
    std::thread::Builder::new()
        .name("config-watch".to_string())
        .spawn(move || process_notify_events(notify_rx, notifier, &file_name, &shown))
        .map_err(notify::Error::io)?;

    Ok(FileWatch {
        path: path.to_path_buf(),
        _debouncer: debouncer,
    })
}

/// Forward debounced events for `file_name` to the notifier until either side
/// goes away.
fn process_notify_events(
    rx: mpsc::Receiver<DebounceEventResult>,
    notifier: ChangeNotifier,
    file_name: &OsString,
    shown: &str,
) {
    loop {
        match rx.recv() {
            Ok(Ok(events)) => {
                let touched = events.iter().any(|event| touches(&event.path, file_name));
                if touched {
                    debug!("Config change detected: {}", shown);
                    if !notifier.notify() {
                        info!("Config watch receiver dropped, stopping");
                        return;
                    }
                }
            }
            Ok(Err(e)) => {
                error!("File watcher error on {}: {}", shown, e);
            }
            Err(_) => {
                debug!("Config watcher channel closed, stopping");
                return;
            }
        }
    }
}

fn touches(event_path: &Path, file_name: &OsString) -> bool {
    event_path.file_name() == Some(file_name.as_os_str())
}
