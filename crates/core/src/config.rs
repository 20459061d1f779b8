use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::discovery::{DEFAULT_EXCLUDED_DIRS, LOCAL_MEMORY_FILE, MEMORY_FILE};
use crate::error::{Error, Result};
use crate::paths::ClaudeHome;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "reflect.toml";

/// File logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLoggingConfig {
    /// Write logs to a daily rolling file
    #[serde(default)]
    pub enabled: bool,

    /// Level for the file layer
    #[serde(default = "default_file_level")]
    pub level: String,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self { enabled: false, level: default_file_level() }
    }
}

fn default_file_level() -> String {
    "debug".to_string()
}

/// `[logging]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Filter directive for stderr (e.g. "warn", "reflect_core=debug")
    #[serde(default = "default_level")]
    pub level: String,

    /// Output format: "pretty", "json" or "compact"
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level(), format: default_format(), file: FileLoggingConfig::default() }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "pretty".to_string()
}

/// Root configuration structure for reflect.toml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// User config directory (default: `$REFLECT_CLAUDE_DIR` or `~/.claude`)
    #[serde(default)]
    pub claude_dir: Option<PathBuf>,

    /// Memory file name looked up in every tier
    #[serde(default = "default_memory_file")]
    pub memory_file: String,

    /// Local override file name in the project root
    #[serde(default = "default_local_file")]
    pub local_file: String,

    /// Directory names skipped by the recursive walk
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_memory_file() -> String {
    MEMORY_FILE.to_string()
}

fn default_local_file() -> String {
    LOCAL_MEMORY_FILE.to_string()
}

fn default_excluded_dirs() -> Vec<String> {
    DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            claude_dir: None,
            memory_file: default_memory_file(),
            local_file: default_local_file(),
            excluded_dirs: default_excluded_dirs(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load configuration from a file if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() { Self::from_file(path) } else { Ok(Self::default()) }
    }

    /// Resolve the user config directory
    ///
    /// The configured `claude_dir` wins over the environment.
    pub fn claude_home(&self) -> Result<ClaudeHome> {
        match &self.claude_dir {
            Some(dir) => Ok(ClaudeHome::new(dir)),
            None => ClaudeHome::from_env(),
        }
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        for (field, name) in [("memory_file", &self.memory_file), ("local_file", &self.local_file)] {
            if name.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", field)));
            }
            if name.contains(['/', '\\']) {
                return Err(Error::Config(format!("{} must be a file name, got '{}'", field, name)));
            }
        }

        if let Some(dir) = &self.claude_dir
            && !dir.is_absolute()
        {
            return Err(Error::Config(format!(
                "claude_dir must be an absolute path, got '{}'",
                dir.display()
            )));
        }

        Ok(())
    }

    /// Get example configuration (as a string)
    pub fn example() -> &'static str {
        r#"# reflect configuration example
# Copy this file to reflect.toml and customize as needed

# User config directory (default: $REFLECT_CLAUDE_DIR or ~/.claude)
# claude_dir = "/home/me/.claude"

# Memory file name looked up globally, at the project root and in subdirectories
memory_file = "CLAUDE.md"

# Uncommitted override at the project root
local_file = "CLAUDE.local.md"

# Directories skipped when walking the project for subdirectory memory files
excluded_dirs = ["node_modules", ".git", ".hg", ".svn", "target", "dist", "build", "out", "coverage", "__pycache__", ".venv", "venv", ".tox", ".next", "vendor"]

[logging]
# Filter directive, overridden by REFLECT_LOG or RUST_LOG
level = "warn"
# "pretty", "json" or "compact" (REFLECT_LOG_FORMAT overrides)
format = "pretty"

[logging.file]
enabled = false
level = "debug"
"#
    }
}
