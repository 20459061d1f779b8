//! User config directory resolution and path rendering
//!
//! Provides deterministic paths for the user-level `~/.claude/` directory: the global memory
//! file, user rules and the per-project auto-memory store.

use crate::error::{Error, Result};
use std::env;
use std::path::{Component, Path, PathBuf};

/// Name of the user-level config directory inside `$HOME`
pub const CLAUDE_DIR_NAME: &str = ".claude";

/// Environment variable that overrides the user-level config directory
pub const CLAUDE_DIR_ENV: &str = "REFLECT_CLAUDE_DIR";

/// Subdirectory holding rule files (both user-level and `.claude/rules/` in a project)
pub const RULES_DIR: &str = "rules";

/// Subdirectory holding per-project data
pub const PROJECTS_DIR: &str = "projects";

/// Subdirectory of a project folder holding auto-memory topic files
pub const MEMORY_DIR: &str = "memory";

/// Subdirectory holding rolling log files
pub const LOGS_DIR: &str = "logs";

/// Display prefix for paths inside the user-level config directory
pub const HOME_DISPLAY_PREFIX: &str = "~/.claude";

/// Display prefix for paths inside the project root
pub const PROJECT_DISPLAY_PREFIX: &str = ".";

/// The user-level config directory (`C`)
///
/// Passed explicitly to every operation that reads user-level files so callers and tests can
/// point it anywhere without touching the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaudeHome {
    root: PathBuf,
}

impl ClaudeHome {
    /// Use an explicit directory as the user config directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the user config directory from the environment
    ///
    /// `REFLECT_CLAUDE_DIR` wins, then `$HOME/.claude`. Fails only when neither is available.
    pub fn from_env() -> Result<Self> {
        if let Some(dir) = env::var_os(CLAUDE_DIR_ENV).filter(|d| !d.is_empty()) {
            return Ok(Self::new(dir));
        }

        dirs::home_dir()
            .map(|home| Self::new(home.join(CLAUDE_DIR_NAME)))
            .ok_or(Error::HomeNotFound)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get path to the global memory file (e.g. `~/.claude/CLAUDE.md`)
    pub fn memory_file(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Get path to the user rules directory
    pub fn rules_dir(&self) -> PathBuf {
        self.root.join(RULES_DIR)
    }

    /// Get path to the projects directory
    pub fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    /// Get path to the log directory
    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    /// Get the auto-memory directory for a project
    ///
    /// `C/projects/<encoded project path>/memory`. Relative project paths are resolved
    /// against the current directory first.
    pub fn auto_memory_dir(&self, project_path: &Path) -> PathBuf {
        let absolute = absolute_path(project_path);
        self.projects_dir()
            .join(get_project_folder_name(&absolute))
            .join(MEMORY_DIR)
    }

    /// Render a path under this directory as `~/.claude/...`
    ///
    /// Paths outside the directory are rendered as-is.
    pub fn display_path(&self, path: &Path) -> String {
        display_under(HOME_DISPLAY_PREFIX, &self.root, path)
    }
}

/// Encode an absolute project path as a single folder name
///
/// Every path separator (and the drive colon on Windows) becomes `-`, so
/// `/Users/bob/myapp` encodes as `-Users-bob-myapp`. The path is normalized first: trailing
/// separators and `.` segments are dropped and `..` segments are resolved, so every spelling
/// of one directory shares one folder and no traversal segment survives.
pub fn get_project_folder_name(abs_path: impl AsRef<Path>) -> String {
    normalize_lexically(abs_path.as_ref())
        .to_string_lossy()
        .replace(['/', '\\', ':'], "-")
}

/// Render a path inside the project root as `./...`
pub fn project_display_path(project_root: &Path, path: &Path) -> String {
    display_under(PROJECT_DISPLAY_PREFIX, project_root, path)
}

/// Make a path absolute and normalized without touching the filesystem
pub fn absolute_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_lexically(&absolute)
}

/// Drop `.` segments and trailing separators, resolve `..` against the preceding segment
///
/// Symlinks are not consulted. A `..` with nothing left to pop is dropped.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn display_under(prefix: &str, base: &Path, path: &Path) -> String {
    let Ok(relative) = path.strip_prefix(base) else {
        return path.display().to_string();
    };

    let parts: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if parts.is_empty() { prefix.to_string() } else { format!("{}/{}", prefix, parts.join("/")) }
}
