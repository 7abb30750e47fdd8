//! Logger collaborator
//!
//! Delegatees report through a [`Logger`]: a leveled sink taking a message and
//! a structured context map. Three sinks ship with the crate:
//!
//! | Sink            | Behaviour                                        |
//! |-----------------|--------------------------------------------------|
//! | [`NullLogger`]    | Discards everything (the default)                |
//! | [`TracingLogger`] | Re-emits records as `tracing` events             |
//! | [`MemoryLogger`]  | Keeps records in memory for later inspection     |

use parking_lot::Mutex;
use tracing::Level;

/// Structured payload attached to a record
pub type LogContext = serde_json::Map<String, serde_json::Value>;

/// Target used for events emitted by [`TracingLogger`]
pub const LOG_TARGET: &str = "simple_delegator";

/// Leveled, structured log sink
pub trait Logger: Send + Sync {
    /// Emit one record
    fn log(&self, level: Level, message: &str, context: &LogContext);

    /// Emit a debug record
    fn debug(&self, message: &str, context: &LogContext) {
        self.log(Level::DEBUG, message, context);
    }

    /// Emit an info record
    fn info(&self, message: &str, context: &LogContext) {
        self.log(Level::INFO, message, context);
    }

    /// Emit a warning record
    fn warn(&self, message: &str, context: &LogContext) {
        self.log(Level::WARN, message, context);
    }

    /// Emit an error record
    fn error(&self, message: &str, context: &LogContext) {
        self.log(Level::ERROR, message, context);
    }
}

/// Logger that discards every record
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _level: Level, _message: &str, _context: &LogContext) {}
}

/// Logger forwarding records to the `tracing` dispatcher
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: &str, context: &LogContext) {
        let context = serde_json::Value::Object(context.clone());
        if level == Level::ERROR {
            tracing::error!(target: LOG_TARGET, %context, "{}", message);
        } else if level == Level::WARN {
            tracing::warn!(target: LOG_TARGET, %context, "{}", message);
        } else if level == Level::INFO {
            tracing::info!(target: LOG_TARGET, %context, "{}", message);
        } else if level == Level::DEBUG {
            tracing::debug!(target: LOG_TARGET, %context, "{}", message);
        } else {
            tracing::trace!(target: LOG_TARGET, %context, "{}", message);
        }
    }
}

/// A captured record
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Severity
    pub level: Level,
    /// Message
    pub message: String,
    /// Structured payload
    pub context: LogContext,
}

/// Logger keeping every record in memory
#[derive(Debug, Default)]
pub struct MemoryLogger {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLogger {
    /// Create an empty logger
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the captured records
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Number of captured records
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Check if nothing was captured
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Drop all captured records
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: &str, context: &LogContext) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
            context: context.clone(),
        });
    }
}
