//! Engine logging facade
//!
//! Every subsystem logs through the `engine_*!` macros with a source tag such
//! as `"ember3d::GraphicsManager"`. Entries are routed to the logger installed
//! with `Engine::set_logger`, or to the colored console `DefaultLogger`.

use colored::*;
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Sink for engine log entries
///
/// # Example
///
/// ```no_run
/// use ember_3d_engine::ember3d::log::{Logger, LogEntry};
///
/// struct FrameLogger;
///
/// impl Logger for FrameLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{}: {}", entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Handle one entry
    fn log(&self, entry: &LogEntry);
}

/// A single log record
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Creation time
    pub timestamp: SystemTime,

    /// Emitting subsystem (e.g. "ember3d::Scene")
    pub source: String,

    /// Formatted message
    pub message: String,

    /// Source file, set for ERROR entries
    pub file: Option<&'static str>,

    /// Source line, set for ERROR entries
    pub line: Option<u32>,
}

/// Log severity levels, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Per-draw noise (uniform cache misses, repeated skips)
    Trace,

    /// Development information
    Debug,

    /// Lifecycle events (program built, atlas resized)
    Info,

    /// Recoverable problems (unknown uniform, missing attribute)
    Warn,

    /// Fatal conditions, logged with file:line
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by the console logger
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Console logger with colored severities
///
/// Format:
/// - `[timestamp] [SEVERITY] [source] message`
/// - `[timestamp] [ERROR] [source] message (file:line)`
///
/// Entries below `min_severity` are dropped.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    /// Logger printing every severity
    pub fn new() -> Self {
        Self { min_severity: LogSeverity::Trace }
    }

    /// Logger printing `min_severity` and above
    pub fn with_min_severity(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// Lowest severity that is printed
    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Whether an entry of this severity would be printed
    pub fn accepts(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }

    /// Render an entry without color codes
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, entry.severity.label(), entry.source, entry.message, file, line
            ),
            _ => format!(
                "[{}] [{}] [{}] {}",
                timestamp, entry.severity.label(), entry.source, entry.message
            ),
        }
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.accepts(entry.severity) {
            return;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity = match entry.severity {
            LogSeverity::Trace => entry.severity.label().bright_black(),
            LogSeverity::Debug => entry.severity.label().cyan(),
            LogSeverity::Info => entry.severity.label().green(),
            LogSeverity::Warn => entry.severity.label().yellow(),
            LogSeverity::Error => entry.severity.label().red().bold(),
        };
        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity, source, entry.message, file, line
            );
        } else {
            println!("[{}] [{}] [{}] {}", timestamp, severity, source, entry.message);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```ignore
/// engine_trace!("ember3d::ShaderProgram", "Resolved '{}'", label);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::ember3d::Engine::log(
            $crate::ember3d::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::ember3d::Engine::log(
            $crate::ember3d::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::ember3d::Engine::log(
            $crate::ember3d::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
///
/// ```ignore
/// engine_warn!("ember3d::GraphicsManager", "Uniform '{}' is not registered", label);
/// ```
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::ember3d::Engine::log(
            $crate::ember3d::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::ember3d::Engine::log_detailed(
            $crate::ember3d::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
