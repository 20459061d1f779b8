//! Per-project auto-memory store

use super::extract_bullets;
use crate::paths::ClaudeHome;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of topic files
pub const TOPIC_EXTENSION: &str = "md";

/// One topic file of the auto-memory store (e.g. `general.md`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoMemoryTopic {
    /// Topic name (file name without extension)
    pub name: String,
    /// Absolute path to the topic file
    pub path: PathBuf,
    /// Raw file content
    pub content: String,
    /// Bullet entries in file order
    pub entries: Vec<String>,
}

/// Read the auto-memory topics of a project
///
/// `None` reads the store of the current directory. A missing store yields no topics.
pub fn read_auto_memory(home: &ClaudeHome, project_path: Option<&Path>) -> Vec<AutoMemoryTopic> {
    let project = match project_path {
        Some(path) => path.to_path_buf(),
        None => match std::env::current_dir() {
            Ok(dir) => dir,
            Err(e) => {
                tracing::debug!("Cannot resolve current directory for auto-memory: {}", e);
                return Vec::new();
            }
        },
    };

    read_auto_memory_dir(&home.auto_memory_dir(&project))
}

/// Read every topic file directly inside an auto-memory directory, sorted by name
pub fn read_auto_memory_dir(dir: &Path) -> Vec<AutoMemoryTopic> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Skipping auto-memory directory {}: {}", dir.display(), e);
            }
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == TOPIC_EXTENSION))
        .collect();
    paths.sort();

    paths.into_iter().filter_map(read_topic).collect()
}

fn read_topic(path: PathBuf) -> Option<AutoMemoryTopic> {
    let name = path.file_stem()?.to_string_lossy().into_owned();
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("Skipping auto-memory topic {}: {}", path.display(), e);
            return None;
        }
    };
    let entries = extract_bullets(&content);

    Some(AutoMemoryTopic { name, path, content, entries })
}
