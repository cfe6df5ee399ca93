//! Configuration for the relay server.
//!
//! Defaults can be overridden via a few environment variables:
//!
//! - `RELAY_BIND_ADDR`  (default: "0.0.0.0")
//! - `RELAY_PORT`       (default: "4000")
//! - `RELAY_FRAMING`    (default: "length", or "line")
//! - `RELAY_LOG_FORMAT` (default: "tracing", or "console")
//!
//! The binary layers command-line flags on top of this.

use std::env;
use std::fmt;
use std::str::FromStr;

use relay_protocol::Framing;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 4000;

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// IP address / interface to bind to (e.g. "0.0.0.0" or "127.0.0.1").
    pub bind_addr: String,

    /// TCP port to listen on. Fixed for the life of the process.
    pub port: u16,

    /// Message framing shared by every client.
    pub framing: Framing,

    /// Which logger the binary installs.
    pub log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Output style of the server log.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// Structured output through `tracing-subscriber`.
    #[default]
    Tracing,

    /// Bare `LOG : <severity> : <text>` lines on stdout.
    Console,
}

#[derive(Debug, Error)]
#[error("unknown log format {0:?} (expected `tracing` or `console`)")]
pub struct ParseLogFormatError(pub String);

impl FromStr for LogFormat {
    type Err = ParseLogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tracing" => Ok(LogFormat::Tracing),
            "console" | "plain" => Ok(LogFormat::Console),
            _ => Err(ParseLogFormatError(s.to_string())),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            port: DEFAULT_PORT,
            framing: Framing::default(),
            log_format: LogFormat::default(),
        }
    }
}

impl Config {
    /// Construct a `Config` from environment variables, falling back
    /// to the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            bind_addr: lookup("RELAY_BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: read_or_default(&lookup, "RELAY_PORT", defaults.port)?,
            framing: read_or_default(&lookup, "RELAY_FRAMING", defaults.framing)?,
            log_format: read_or_default(&lookup, "RELAY_LOG_FORMAT", defaults.log_format)?,
        })
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn read_or_default<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        Some(value) => value.parse::<T>().map_err(|err| ConfigError::InvalidValue {
            key,
            reason: err.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
