pub mod config;
pub mod discovery;
pub mod error;
pub mod frontmatter;
pub mod logging;
pub mod memory;
pub mod paths;
pub mod routing;

pub use config::{CONFIG_FILE, Config, FileLoggingConfig};
pub use discovery::{DEFAULT_EXCLUDED_DIRS, Discovery, FileDescriptor, FileType, LOCAL_MEMORY_FILE, MEMORY_FILE};
pub use error::{Error, Result};
pub use frontmatter::{Frontmatter, FrontmatterValue, parse_frontmatter_str, parse_rule_frontmatter};
pub use memory::{
    AutoMemoryTopic, EntrySource, MemoryEntry, extract_bullets, read_all_memory_entries, read_auto_memory,
    read_auto_memory_dir,
};
pub use paths::{ClaudeHome, get_project_folder_name};
pub use routing::{
    LearningType, Route, RouteReason, Tier, route_learning, suggest_auto_memory_topic, suggest_claude_file,
};
