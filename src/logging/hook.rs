//! Structured log hook writing to the rotating log file.
//!
//! [`HookLayer`] plugs the hooks into `tracing`: every event becomes a
//! [`LogEntry`] that each hook writes as one JSON line.

use super::rotation::RotatingWriter;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::io;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// One structured log record.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<Utc>,
    pub level: String,
    #[serde(rename = "logger", skip_serializing_if = "String::is_empty")]
    pub target: String,
    #[serde(rename = "msg")]
    pub message: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogEntry {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level: level.as_str().to_ascii_lowercase(),
            target: String::new(),
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// Writes log entries to the shared rotating writer.
#[derive(Clone)]
pub struct LoggingHook {
    writer: Arc<RotatingWriter>,
}

impl LoggingHook {
    pub fn new(writer: Arc<RotatingWriter>) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &Arc<RotatingWriter> {
        &self.writer
    }

    /// Format `entry` and write it. Only a failed write is an error.
    pub fn apply(&self, entry: &LogEntry) -> io::Result<()> {
        let mut line = serde_json::to_vec(entry)?;
        line.push(b'\n');
        self.writer.write_record(&line)
    }
}

impl fmt::Debug for LoggingHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingHook")
            .field("path", &self.writer.path())
            .finish()
    }
}

/// `tracing` layer that hands every event to a set of hooks.
///
/// Hook failures are reported on stderr and never interrupt the caller.
pub struct HookLayer {
    hooks: Vec<LoggingHook>,
}

impl HookLayer {
    pub fn new(hooks: Vec<LoggingHook>) -> Self {
        Self { hooks }
    }
}

impl<S: Subscriber> Layer<S> for HookLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if self.hooks.is_empty() {
            return;
        }
        let meta = event.metadata();
        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let mut entry = LogEntry::new(*meta.level(), visitor.message).with_target(meta.target());
        entry.fields = visitor.fields;

        for hook in &self.hooks {
            if let Err(e) = hook.apply(&entry) {
                eprintln!("logging hook failed to write {}: {}", hook.writer.path().display(), e);
            }
        }
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: String,
    fields: Map<String, Value>,
}

impl EntryVisitor {
    fn put(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
        } else {
            self.fields.insert(field.name().to_string(), value);
        }
    }
}

impl Visit for EntryVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::String(value.to_string()));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }
}
