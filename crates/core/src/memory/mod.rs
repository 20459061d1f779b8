//! Memory entry aggregation
//!
//! Memory files are plain markdown; every bullet line is one entry:
//!
//! ```markdown
//! # Preferences
//! - Use gpt-5.1 for reasoning
//! - Always run tests before deploying
//! ```
//!
//! Two stores are read:
//!
//! - **Hierarchy**: the global, root, local and subdirectory `CLAUDE.md` tiers found by
//!   [`Discovery`](crate::discovery::Discovery). Rule files are structural and not read here.
//! - **Auto-memory**: topic files under `~/.claude/projects/<encoded project>/memory/`.
//!
//! # Example
//!
//! ```no_run
//! use reflect_core::{ClaudeHome, Discovery, read_all_memory_entries};
//!
//! let discovery = Discovery::new(ClaudeHome::from_env()?);
//! for entry in read_all_memory_entries(&discovery, std::path::Path::new(".")) {
//!     println!("[{}] {}", entry.source_type, entry.text);
//! }
//! # Ok::<(), reflect_core::Error>(())
//! ```

mod auto;
mod entries;

pub use auto::{AutoMemoryTopic, read_auto_memory, read_auto_memory_dir};
pub use entries::{EntrySource, MemoryEntry, read_all_memory_entries};

/// Bullet markers recognized at the start of a line
pub const BULLET_MARKERS: &[&str] = &["- ", "* "];

/// Extract bullet entries from markdown content
///
/// Headings, fenced code blocks, empty bullets and horizontal rules are skipped. Entry order
/// follows the content.
pub fn extract_bullets(content: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut in_fence = false;

    for line in content.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence || trimmed.starts_with('#') {
            continue;
        }

        let Some(rest) = BULLET_MARKERS.iter().find_map(|marker| trimmed.strip_prefix(marker)) else {
            continue;
        };

        let text = rest.trim();
        if text.chars().any(|c| !matches!(c, '-' | '*' | '_' | ' ')) {
            entries.push(text.to_string());
        }
    }

    entries
}
