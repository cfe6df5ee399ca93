//! Diagnostic logging for the relay.
//!
//! Components never reach for a global logger: the server is handed a
//! [`SharedLogger`] at construction and passes it down to the registry.
//! Logging is fire-and-forget; no implementation returns an error.
//!
//! - [`TracingLogger`] forwards to `tracing` (default for the binary).
//! - [`ConsoleLogger`] prints the classic `LOG : <severity> : <text>`
//!   lines straight to stdout.

use std::fmt;
use std::io::Write;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt as tracing_fmt, EnvFilter};

use crate::config::LogFormat;

/// Severity of a log entry.
///
/// There is no separate "error": `Fatal` covers failures the server
/// cannot recover from (e.g. the listening socket).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warn,
    Fatal,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging capability injected into the server.
pub trait Logger: Send + Sync {
    fn log(&self, severity: Severity, text: &str);

    fn info(&self, text: &str) {
        self.log(Severity::Info, text);
    }

    fn warn(&self, text: &str) {
        self.log(Severity::Warn, text);
    }

    fn fatal(&self, text: &str) {
        self.log(Severity::Fatal, text);
    }
}

pub type SharedLogger = Arc<dyn Logger>;

/// Plain stdout logger: a blank line, then `LOG : <severity> : <text>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, severity: Severity, text: &str) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let _ = out.write_all(format_entry(severity, text).as_bytes());
        let _ = out.flush();
    }
}

/// Format one console entry, including the leading blank line.
pub fn format_entry(severity: Severity, text: &str) -> String {
    format!("\nLOG : {severity} : {text}\n")
}

/// Forwards entries to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => info!("{text}"),
            Severity::Warn => warn!("{text}"),
            Severity::Fatal => error!(severity = "fatal", "{text}"),
        }
    }
}

/// Build the logger selected by the configuration.
pub fn for_format(format: LogFormat) -> SharedLogger {
    match format {
        LogFormat::Tracing => Arc::new(TracingLogger),
        LogFormat::Console => Arc::new(ConsoleLogger),
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `default_level` when set.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_fmt().with_env_filter(filter).with_target(false).try_init();
}
