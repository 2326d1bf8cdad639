//! Logging and error-reporting capability handed to the engine.

use tracing::{debug, error, info, warn};

use crate::error::ImprovError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Where the engine sends its log lines and internal errors.
///
/// Errors are additionally emitted to the host as `"error"` events by the engine.
pub trait Reporter: Send + Sync {
    fn log(&self, level: LogLevel, message: &str);

    fn report_error(&self, error: &ImprovError);
}

/// Reports through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => debug!(target: "improv", "{message}"),
            LogLevel::Info => info!(target: "improv", "{message}"),
            LogLevel::Warn => warn!(target: "improv", "{message}"),
            LogLevel::Error => error!(target: "improv", "{message}"),
        }
    }

    fn report_error(&self, err: &ImprovError) {
        error!(target: "improv", error = %err, "improv error");
    }
}
