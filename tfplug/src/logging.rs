//! Logging bootstrap
//!
//! Terraform reads the plugin handshake from stdout, so logs always go to stderr.

use crate::error::{Result, TfplugError};
use std::str::FromStr;
use std::sync::OnceLock;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Level from `TF_LOG`, falling back to Info when unset or unrecognised
    pub fn from_env() -> Self {
        std::env::var("TF_LOG")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(LogLevel::Info)
    }
}

impl FromStr for LogLevel {
    type Err = TfplugError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" | "JSON" => Ok(LogLevel::Trace),
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARN" => Ok(LogLevel::Warn),
            "ERROR" => Ok(LogLevel::Error),
            other => Err(TfplugError::LoggingError(format!(
                "unknown log level {:?}",
                other
            ))),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

static INSTALLED: OnceLock<LogLevel> = OnceLock::new();

/// Installs the global stderr subscriber at `level`. Later calls are no-ops and
/// return the level that was installed first.
pub fn init(level: LogLevel) -> LogLevel {
    if let Some(existing) = INSTALLED.get() {
        return *existing;
    }

    // Fails only when the host already installed a global subscriber; that one keeps logging
    if let Err(e) = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(LevelFilter::from(level))
        .with_target(true)
        .with_ansi(false)
        .try_init()
    {
        tracing::debug!("Keeping existing tracing subscriber: {}", e);
    }

    *INSTALLED.get_or_init(|| level)
}

/// `init` with the level taken from `TF_LOG`
pub fn init_from_env() -> LogLevel {
    init(LogLevel::from_env())
}
