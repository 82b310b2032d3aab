//! # Logging Utilities
//!
//! Logging infrastructure for argscope using `tracing`.
//!
//! This module provides structured logging with support for:
//! - Multiple output formats (JSON for production, pretty for development)
//! - Environment variable configuration
//! - Log level filtering
//! - Optional file output
//!
//! Console output goes to stderr so that command output on stdout stays
//! machine-readable.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use argscope_utils::init_logging;
//!
//! // Initialize with default settings (reads from RUST_LOG env var)
//! let _guard = init_logging().expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level filter (e.g., `RUST_LOG=debug`, `RUST_LOG=argscope_core=trace`)
//! - `ARGSCOPE_LOG_FORMAT`: Set output format (`json` or `pretty`, default: `pretty`)
//! - `ARGSCOPE_LOG_FILE`: Optional path to log file (if not set, logs only to the console)

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

pub const LOG_FORMAT_ENV: &str = "ARGSCOPE_LOG_FORMAT";
pub const LOG_FILE_ENV: &str = "ARGSCOPE_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format (default for development)
    Pretty,
    /// JSON format (default for production)
    Json,
}

impl FromStr for LogFormat
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "dev" | "development" => Ok(LogFormat::Pretty),
            "json" | "prod" | "production" => Ok(LogFormat::Json),
            _ => Err(format!("Unknown log format: {s}. Use 'pretty' or 'json'")),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default for the CLI)
    Warn,
    /// Info level
    Info,
    /// Debug level
    Debug,
    /// Trace level (most verbose)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!(
                "Unknown log level: {s}. Use 'error', 'warn', 'info', 'debug', or 'trace'"
            )),
        }
    }
}

/// Keeps the file writer flushing until dropped.
///
/// Hold on to it for the lifetime of the program; dropping it early loses
/// buffered file output.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard
{
    _file: Option<WorkerGuard>,
}

/// Initialize logging with default settings
///
/// Reads configuration from environment variables:
/// - `RUST_LOG`: Log level filter (e.g., `debug`, `argscope_core=debug`)
/// - `ARGSCOPE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
/// - `ARGSCOPE_LOG_FILE`: Optional path to log file
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging() -> Result<LoggingGuard, LoggingError>
{
    // Read format from environment or default to pretty
    let format = env::var(LOG_FORMAT_ENV)
        .ok()
        .and_then(|s| LogFormat::from_str(&s).ok())
        .unwrap_or(LogFormat::Pretty);

    init_logging_internal(format, None)
}

/// Initialize logging with explicit level and format
///
/// An explicit level overrides `RUST_LOG`.
///
/// ## Example
///
/// ```rust,no_run
/// use argscope_utils::{LogFormat, LogLevel, init_logging_with_level};
///
/// let _guard = init_logging_with_level(LogLevel::Debug, LogFormat::Pretty)
///     .expect("Failed to initialize logging");
/// ```
///
/// ## Errors
///
/// Returns an error if logging is already initialized.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<LoggingGuard, LoggingError>
{
    init_logging_internal(format, Some(level.into()))
}

/// Build the level filter
///
/// Priority:
/// 1. An explicit level (from a `--log-level` CLI flag)
/// 2. `RUST_LOG` (allows module-specific filters like "argscope_core=debug")
/// 3. `WARN`
fn build_filter(explicit_level: Option<Level>) -> EnvFilter
{
    if let Some(level) = explicit_level {
        EnvFilter::new(level.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    }
}

fn file_appender(path: &Path) -> (tracing_appender::non_blocking::NonBlocking, WorkerGuard)
{
    let directory = path.parent().filter(|dir| !dir.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let appender = tracing_appender::rolling::daily(directory, path.file_name().unwrap_or_default());
    tracing_appender::non_blocking(appender)
}

fn init_logging_internal(format: LogFormat, explicit_level: Option<Level>) -> Result<LoggingGuard, LoggingError>
{
    // Check if file logging is requested
    let log_file = env::var(LOG_FILE_ENV).ok().map(PathBuf::from);

    let mut guard = None;
    let result = match format {
        LogFormat::Pretty => {
            let console_layer = fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(true)
                .with_writer(io::stderr)
                .with_filter(build_filter(explicit_level));

            if let Some(file_path) = log_file {
                let (non_blocking, file_guard) = file_appender(&file_path);
                guard = Some(file_guard);
                let file_layer = fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_ansi(false) // No ANSI in files
                    .with_filter(build_filter(explicit_level));

                Registry::default().with(console_layer).with(file_layer).try_init()
            } else {
                Registry::default().with(console_layer).try_init()
            }
        }
        LogFormat::Json => {
            let console_layer = fmt::layer()
                .json()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_timer(ChronoUtc::rfc_3339())
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(io::stderr)
                .with_filter(build_filter(explicit_level));

            if let Some(file_path) = log_file {
                let (non_blocking, file_guard) = file_appender(&file_path);
                guard = Some(file_guard);
                let file_layer = fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_timer(ChronoUtc::rfc_3339())
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_filter(build_filter(explicit_level));

                Registry::default().with(console_layer).with(file_layer).try_init()
            } else {
                Registry::default().with(console_layer).try_init()
            }
        }
    };

    result.map_err(|err| LoggingError::InitializationFailed(err.to_string()))?;
    Ok(LoggingGuard { _file: guard })
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),
}
