//! Logging setup on top of the tracing ecosystem.
//!
//! # Environment Variables
//!
//! - `REFLECT_LOG`: Filter directive (like `RUST_LOG`), e.g., `reflect_core=debug`
//! - `REFLECT_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `REFLECT_LOG_DIR`: Directory for the rolling log file, over the configured one
//!   (default: `<claude dir>/logs`)
//!
//! # Configuration
//!
//! Logging is configured via the `[logging]` section in `reflect.toml`:
//!
//! ```toml
//! [logging]
//! level = "warn"
//! format = "pretty"
//!
//! [logging.file]
//! enabled = false
//! level = "debug"
//! ```
//!
//! # Example
//!
//! ```no_run
//! use reflect_core::logging;
//!
//! // Keep the guard alive so buffered file output is flushed on exit
//! let _guard = logging::init_logging(None)?;
//! # Ok::<(), reflect_core::Error>(())
//! ```

use crate::Error;
use crate::config::{FileLoggingConfig, LoggingConfig as ConfigLoggingConfig};
use crate::paths::ClaudeHome;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive environment variable
pub const LOG_ENV: &str = "REFLECT_LOG";
/// Output format environment variable
pub const LOG_FORMAT_ENV: &str = "REFLECT_LOG_FORMAT";
/// Log directory environment variable
pub const LOG_DIR_ENV: &str = "REFLECT_LOG_DIR";
/// File name prefix of the daily rolling log
pub const LOG_FILE_NAME: &str = "reflect.log";

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors (default for TTY)
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    /// All available log formats.
    pub const VALUES: &[LogFormat] = &[LogFormat::Pretty, LogFormat::Json, LogFormat::Compact];

    /// Parse a log format from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    /// Get the string representation of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

/// Logging configuration resolved from the `[logging]` section.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level for stderr output.
    pub level: String,
    /// Output format for stderr. `None` picks by TTY.
    pub format: Option<LogFormat>,
    /// File logging configuration (only when enabled).
    pub file: Option<FileLoggingConfig>,
    /// Directory for the log file, usually the resolved user config directory's `logs/`.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "warn".to_string(), format: None, file: None, log_dir: None }
    }
}

impl From<ConfigLoggingConfig> for LoggingConfig {
    fn from(config: ConfigLoggingConfig) -> Self {
        Self {
            level: config.level,
            format: LogFormat::parse_str(&config.format),
            file: if config.file.enabled { Some(config.file) } else { None },
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Enable file logging.
    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file = Some(config);
        self
    }

    /// Set the directory for the log file.
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Filter directive: `REFLECT_LOG`, then `RUST_LOG`, then the configured level.
    fn filter_directive(&self) -> String {
        env::var(LOG_ENV)
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_else(|| self.level.clone())
    }

    fn build_env_filter(&self) -> Result<EnvFilter, Error> {
        let directive = self.filter_directive();
        EnvFilter::try_new(&directive)
            .map_err(|e| Error::Logging(format!("invalid filter directive '{}': {}", directive, e)))
    }

    /// Detect if stderr is a TTY for pretty formatting.
    fn is_tty() -> bool {
        atty::is(atty::Stream::Stderr)
    }

    /// Determine the appropriate format for stderr output.
    fn detect_format(&self) -> LogFormat {
        if let Ok(fmt_str) = env::var(LOG_FORMAT_ENV)
            && let Some(fmt) = LogFormat::parse_str(&fmt_str)
        {
            return fmt;
        }

        if let Some(format) = self.format {
            return format;
        }

        if Self::is_tty() { LogFormat::Pretty } else { LogFormat::Compact }
    }

    /// Get the log directory path: `REFLECT_LOG_DIR`, then the configured directory, then
    /// the environment's user config directory.
    fn get_log_dir(&self) -> Result<PathBuf, Error> {
        if let Some(custom_dir) = env::var_os(LOG_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(custom_dir));
        }

        if let Some(dir) = &self.log_dir {
            return Ok(dir.clone());
        }

        Ok(ClaudeHome::from_env()?.logs_dir())
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// This function sets up the global tracing subscriber with:
/// - Environment-based filter (from `REFLECT_LOG` or `RUST_LOG`)
/// - Formatted stderr output (pretty, json, or compact)
/// - Optional daily rolling JSON file output
///
/// When file logging is enabled the returned guard must be held until exit, otherwise
/// buffered lines are lost.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<Option<WorkerGuard>, Error> {
    let config = config.unwrap_or_default();
    let env_filter = config.build_env_filter()?;
    let format = config.detect_format();

    let stderr_layer = match format {
        LogFormat::Pretty => fmt::layer().pretty().with_writer(io::stderr).with_ansi(LoggingConfig::is_tty()).boxed(),
        LogFormat::Json => fmt::layer().json().with_writer(io::stderr).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_writer(io::stderr).boxed(),
    }
    .with_filter(env_filter);

    let (file_layer, guard) = match &config.file {
        Some(file_config) => {
            let log_dir = config.get_log_dir()?;
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| Error::Logging(format!("Failed to create log directory: {}", e)))?;

            let file_filter = EnvFilter::try_new(&file_config.level)
                .map_err(|e| Error::Logging(format!("invalid file level '{}': {}", file_config.level, e)))?;
            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer().json().with_writer(non_blocking).with_filter(file_filter);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    Registry::default()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Logging(e.to_string()))?;

    Ok(guard)
}

/// Sanitize file paths for logging (home directory shown as `~`).
pub fn sanitize_path(path: &Path) -> String {
    if let Some(home) = dirs::home_dir()
        && let Ok(stripped) = path.strip_prefix(&home)
    {
        return Path::new("~").join(stripped).display().to_string();
    }

    path.display().to_string()
}
