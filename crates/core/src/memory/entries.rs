//! Flattened memory entries across every tier

use super::auto::read_auto_memory;
use super::extract_bullets;
use crate::discovery::{Discovery, FileType};

use serde::Serialize;
use std::fs;
use std::path::Path;

/// Where an entry came from: a hierarchy tier or an auto-memory topic
///
/// Serialized as the bare tier or topic name. A topic may share a tier's name (`global.md`),
/// so the JSON form is output only and `source_file` tells the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntrySource {
    Tier(FileType),
    Topic(String),
}

impl EntrySource {
    pub fn as_str(&self) -> &str {
        match self {
            EntrySource::Tier(file_type) => file_type.as_str(),
            EntrySource::Topic(name) => name,
        }
    }
}

impl std::fmt::Display for EntrySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One bullet entry from a memory file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemoryEntry {
    /// Bullet text without the marker
    pub text: String,
    /// Display path of the source file
    pub source_file: String,
    /// Tier of the source file, or the auto-memory topic name
    pub source_type: EntrySource,
}

/// Read every memory entry visible to a project
///
/// Entries from the hierarchy come first, in discovery order, followed by auto-memory
/// topics. Files that cannot be read are skipped.
pub fn read_all_memory_entries(discovery: &Discovery, project_path: &Path) -> Vec<MemoryEntry> {
    let mut entries = Vec::new();

    for file in discovery.find_memory_files(project_path) {
        let content = match fs::read_to_string(&file.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Skipping memory file {}: {}", file.relative_path, e);
                continue;
            }
        };

        entries.extend(extract_bullets(&content).into_iter().map(|text| MemoryEntry {
            text,
            source_file: file.relative_path.clone(),
            source_type: EntrySource::Tier(file.file_type),
        }));
    }

    let home = discovery.home();
    for topic in read_auto_memory(home, Some(project_path)) {
        let source_file = home.display_path(&topic.path);
        entries.extend(topic.entries.into_iter().map(|text| MemoryEntry {
            text,
            source_file: source_file.clone(),
            source_type: EntrySource::Topic(topic.name.clone()),
        }));
    }

    tracing::debug!("Read {} memory entries", entries.len());
    entries
}
