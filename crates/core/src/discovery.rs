//! Memory file discovery for CLAUDE.md compatibility
//!
//! Builds the inventory of memory and rule files visible to a project:
//!
//! 1. Global: `~/.claude/CLAUDE.md`
//! 2. Root: `<project>/CLAUDE.md`
//! 3. Local: `<project>/CLAUDE.local.md`
//! 4. Subdirectory: `<project>/**/CLAUDE.md`, skipping excluded directories
//! 5. Project rules: `<project>/.claude/rules/*.md`
//! 6. User rules: `~/.claude/rules/*.md`
//!
//! Only the recursive walk (4) honors the exclusion list; the fixed locations are always read.

use crate::config::Config;
use crate::frontmatter::{Frontmatter, parse_rule_frontmatter};
use crate::logging::sanitize_path;
use crate::paths::{ClaudeHome, RULES_DIR, absolute_path, project_display_path};

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

/// Memory file name looked up in every tier
pub const MEMORY_FILE: &str = "CLAUDE.md";

/// Local override file name (gitignored by convention)
pub const LOCAL_MEMORY_FILE: &str = "CLAUDE.local.md";

/// Project-level config directory; the only hidden directory the walk enters
pub const PROJECT_CONFIG_DIR: &str = ".claude";

/// Extension of rule files
pub const RULE_EXTENSION: &str = "md";

/// Directories skipped by the recursive walk
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".hg",
    ".svn",
    "target",
    "dist",
    "build",
    "out",
    "coverage",
    "__pycache__",
    ".venv",
    "venv",
    ".tox",
    ".next",
    "vendor",
];

/// Tier a discovered file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileType {
    Global,
    Root,
    Subdirectory,
    Local,
    Rule,
    UserRule,
}

impl FileType {
    pub const VALUES: &[FileType] = &[
        FileType::Global,
        FileType::Root,
        FileType::Subdirectory,
        FileType::Local,
        FileType::Rule,
        FileType::UserRule,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Global => "global",
            FileType::Root => "root",
            FileType::Subdirectory => "subdirectory",
            FileType::Local => "local",
            FileType::Rule => "rule",
            FileType::UserRule => "user-rule",
        }
    }

    /// Tiers that carry free-text bullet entries
    pub fn is_memory_tier(&self) -> bool {
        matches!(
            self,
            FileType::Global | FileType::Root | FileType::Subdirectory | FileType::Local
        )
    }

    /// Tiers that carry frontmatter
    pub fn is_rule(&self) -> bool {
        matches!(self, FileType::Rule | FileType::UserRule)
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of the discovery inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Display path (`./...` or `~/.claude/...`)
    pub relative_path: String,
    /// Tier of the file
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// Parsed header, only for rule files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontmatter: Option<Frontmatter>,
}

impl FileDescriptor {
    pub fn new(path: PathBuf, relative_path: impl Into<String>, file_type: FileType) -> Self {
        Self { path, relative_path: relative_path.into(), file_type, frontmatter: None }
    }

    pub fn with_frontmatter(mut self, frontmatter: Option<Frontmatter>) -> Self {
        self.frontmatter = frontmatter;
        self
    }

    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Declared path scope (empty when the file has no frontmatter)
    pub fn scoped_paths(&self) -> Vec<String> {
        self.frontmatter.as_ref().map(Frontmatter::paths).unwrap_or_default()
    }
}

/// Check a directory name against the exclusion list
///
/// Hidden directories are excluded too, except the project config directory.
pub fn is_excluded_dir(name: &str, excluded: &[String]) -> bool {
    if excluded.iter().any(|e| e == name) {
        return true;
    }
    name.starts_with('.') && name != PROJECT_CONFIG_DIR
}

/// Discovers memory and rule files for a project
#[derive(Debug, Clone)]
pub struct Discovery {
    home: ClaudeHome,
    memory_file: String,
    local_file: String,
    excluded_dirs: Vec<String>,
}

impl Discovery {
    /// Create a discoverer with default file names and exclusions
    pub fn new(home: ClaudeHome) -> Self {
        Self {
            home,
            memory_file: MEMORY_FILE.to_string(),
            local_file: LOCAL_MEMORY_FILE.to_string(),
            excluded_dirs: DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// Create a discoverer from configuration
    pub fn from_config(home: ClaudeHome, config: &Config) -> Self {
        Self {
            home,
            memory_file: config.memory_file.clone(),
            local_file: config.local_file.clone(),
            excluded_dirs: config.excluded_dirs.clone(),
        }
    }

    /// Replace the exclusion list
    pub fn with_excluded_dirs<I, S>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    pub fn home(&self) -> &ClaudeHome {
        &self.home
    }

    pub fn excluded_dirs(&self) -> &[String] {
        &self.excluded_dirs
    }

    /// Discover every tier, rules included
    pub fn find_claude_files(&self, project_root: &Path) -> Vec<FileDescriptor> {
        self.collect(project_root, true)
    }

    /// Discover only the tiers that carry bullet entries (global, root, local, subdirectory)
    pub fn find_memory_files(&self, project_root: &Path) -> Vec<FileDescriptor> {
        self.collect(project_root, false)
    }

    fn collect(&self, project_root: &Path, include_rules: bool) -> Vec<FileDescriptor> {
        let root = absolute_path(project_root);
        let mut inventory = Inventory::default();

        let global = self.home.memory_file(&self.memory_file);
        if global.is_file() {
            let display = self.home.display_path(&global);
            inventory.push(FileDescriptor::new(global, display, FileType::Global));
        }

        let root_file = root.join(&self.memory_file);
        if root_file.is_file() {
            let display = project_display_path(&root, &root_file);
            inventory.push(FileDescriptor::new(root_file, display, FileType::Root));
        }

        let local_file = root.join(&self.local_file);
        if local_file.is_file() {
            let display = project_display_path(&root, &local_file);
            inventory.push(FileDescriptor::new(local_file, display, FileType::Local));
        }

        for path in self.scan_subdirectories(&root) {
            let display = project_display_path(&root, &path);
            inventory.push(FileDescriptor::new(path, display, FileType::Subdirectory));
        }

        if include_rules {
            for path in scan_rule_dir(&root.join(PROJECT_CONFIG_DIR).join(RULES_DIR)) {
                let display = project_display_path(&root, &path);
                let frontmatter = parse_rule_frontmatter(&path);
                inventory.push(FileDescriptor::new(path, display, FileType::Rule).with_frontmatter(frontmatter));
            }

            for path in scan_rule_dir(&self.home.rules_dir()) {
                let display = self.home.display_path(&path);
                let frontmatter = parse_rule_frontmatter(&path);
                inventory.push(FileDescriptor::new(path, display, FileType::UserRule).with_frontmatter(frontmatter));
            }
        }

        tracing::debug!(
            "Discovered {} files for {}",
            inventory.files.len(),
            sanitize_path(&root)
        );
        inventory.files
    }

    /// Breadth-first walk collecting memory files below the project root
    fn scan_subdirectories(&self, root: &Path) -> Vec<PathBuf> {
        let mut found = Vec::new();
        let mut queue = VecDeque::from([root.to_path_buf()]);

        while let Some(dir) = queue.pop_front() {
            for entry in sorted_entries(&dir) {
                let Ok(file_type) = entry.file_type() else {
                    continue;
                };
                let name = entry.file_name();
                let name = name.to_string_lossy();

                if file_type.is_dir() {
                    if is_excluded_dir(&name, &self.excluded_dirs) {
                        tracing::trace!("Skipping excluded directory {}", entry.path().display());
                        continue;
                    }
                    queue.push_back(entry.path());
                } else if dir != root && name == self.memory_file.as_str() && is_regular_file(&entry) {
                    tracing::trace!("Found subdirectory memory file {}", entry.path().display());
                    found.push(entry.path());
                }
            }
        }

        found
    }
}

#[derive(Default)]
struct Inventory {
    files: Vec<FileDescriptor>,
    seen: HashSet<PathBuf>,
}

impl Inventory {
    fn push(&mut self, descriptor: FileDescriptor) {
        if self.seen.insert(descriptor.path.clone()) {
            self.files.push(descriptor);
        }
    }
}

/// Markdown files directly inside a rules directory, sorted by name
fn scan_rule_dir(dir: &Path) -> Vec<PathBuf> {
    sorted_entries(dir)
        .into_iter()
        .filter(is_regular_file)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == RULE_EXTENSION))
        .collect()
}

/// Directory entries sorted by name; unreadable or missing directories yield nothing
fn sorted_entries(dir: &Path) -> Vec<fs::DirEntry> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Skipping unreadable directory {}: {}", dir.display(), e);
            }
            return Vec::new();
        }
    };

    let mut entries: Vec<fs::DirEntry> = entries.flatten().collect();
    entries.sort_by_key(|e| e.file_name());
    entries
}

/// Regular files, plus symlinks that resolve to one
fn is_regular_file(entry: &fs::DirEntry) -> bool {
    match entry.file_type() {
        Ok(ft) if ft.is_file() => true,
        Ok(ft) if ft.is_symlink() => entry.path().is_file(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Fixture {
        temp: TempDir,
        discovery: Discovery,
    }

    impl Fixture {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let claude = temp.path().join("fake_claude");
            let project = temp.path().join("project");
            fs::create_dir_all(&claude).unwrap();
            fs::create_dir_all(&project).unwrap();
            let discovery = Discovery::new(ClaudeHome::new(claude));
            Self { temp, discovery }
        }

        fn claude(&self) -> PathBuf {
            self.temp.path().join("fake_claude")
        }

        fn project(&self) -> PathBuf {
            self.temp.path().join("project")
        }

        fn write(&self, path: PathBuf, content: &str) {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }

        fn find(&self) -> Vec<FileDescriptor> {
            self.discovery.find_claude_files(&self.project())
        }
    }

    fn of_type(files: &[FileDescriptor], file_type: FileType) -> Vec<&FileDescriptor> {
        files.iter().filter(|f| f.file_type == file_type).collect()
    }

    #[test]
    fn test_discovers_project_rules() {
        let fx = Fixture::new();
        let rules = fx.project().join(".claude").join("rules");
        fx.write(rules.join("guardrails.md"), "# Guardrails\n- Don't over-engineer\n");
        fx.write(rules.join("coding-style.md"), "# Style\n- Use 2-space indent\n");
        fx.write(rules.join("notes.txt"), "not a rule\n");

        let files = fx.find();
        let names: Vec<_> = of_type(&files, FileType::Rule)
            .iter()
            .map(|f| f.file_name().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["coding-style.md", "guardrails.md"]);
    }

    #[test]
    fn test_rule_frontmatter_parsing() {
        let fx = Fixture::new();
        let rules = fx.project().join(".claude").join("rules");
        fx.write(rules.join("api.md"), "---\npaths:\n  - src/api/\n---\n\n# API Rules\n");

        let files = fx.find();
        let rule_files = of_type(&files, FileType::Rule);
        assert_eq!(rule_files.len(), 1);
        assert_eq!(rule_files[0].scoped_paths(), vec!["src/api/"]);
        assert_eq!(rule_files[0].relative_path, "./.claude/rules/api.md");
    }

    #[test]
    fn test_discovers_user_rules() {
        let fx = Fixture::new();
        fx.write(fx.claude().join("rules").join("model-prefs.md"), "# Models\n- Use gpt-5.1\n");

        let files = fx.find();
        let user_rules = of_type(&files, FileType::UserRule);
        assert_eq!(user_rules.len(), 1);
        assert_eq!(user_rules[0].relative_path, "~/.claude/rules/model-prefs.md");
        assert!(user_rules[0].frontmatter.is_none());
    }

    #[test]
    fn test_discovers_local_claude() {
        let fx = Fixture::new();
        fx.write(fx.project().join("CLAUDE.local.md"), "# Local\n- My setting\n");

        let files = fx.find();
        let local = of_type(&files, FileType::Local);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].relative_path, "./CLAUDE.local.md");
    }

    #[test]
    fn test_global_present_or_absent() {
        let fx = Fixture::new();
        assert!(of_type(&fx.find(), FileType::Global).is_empty());

        fx.write(fx.claude().join("CLAUDE.md"), "# Global\n");
        let files = fx.find();
        let global = of_type(&files, FileType::Global);
        assert_eq!(global.len(), 1);
        assert_eq!(global[0].relative_path, "~/.claude/CLAUDE.md");
    }

    #[test]
    fn test_all_types_in_tier_order() {
        let fx = Fixture::new();
        fx.write(fx.claude().join("CLAUDE.md"), "# Global\n");
        fx.write(fx.claude().join("rules").join("user-rule.md"), "# User Rule\n");
        fx.write(fx.project().join("CLAUDE.md"), "# Root\n");
        fx.write(fx.project().join("CLAUDE.local.md"), "# Local\n");
        fx.write(fx.project().join(".claude").join("rules").join("style.md"), "# Style\n");
        fx.write(fx.project().join("src").join("CLAUDE.md"), "# Src\n");

        let types: Vec<FileType> = fx.find().iter().map(|f| f.file_type).collect();
        assert_eq!(
            types,
            vec![
                FileType::Global,
                FileType::Root,
                FileType::Local,
                FileType::Subdirectory,
                FileType::Rule,
                FileType::UserRule,
            ]
        );
    }

    #[test]
    fn test_subdirectories_walked_breadth_first() {
        let fx = Fixture::new();
        fx.write(fx.project().join("b").join("deep").join("CLAUDE.md"), "# Deep\n");
        fx.write(fx.project().join("a").join("CLAUDE.md"), "# A\n");
        fx.write(fx.project().join("b").join("CLAUDE.md"), "# B\n");

        let files = fx.find();
        let subdirs: Vec<_> = of_type(&files, FileType::Subdirectory)
            .iter()
            .map(|f| f.relative_path.clone())
            .collect();
        assert_eq!(subdirs, vec!["./a/CLAUDE.md", "./b/CLAUDE.md", "./b/deep/CLAUDE.md"]);
    }

    #[test]
    fn test_excluded_dirs_skipped() {
        let fx = Fixture::new();
        let nm = fx.project().join("node_modules");
        fx.write(nm.join("CLAUDE.md"), "# Should be excluded\n");
        fx.write(nm.join(".claude").join("rules").join("bad.md"), "# Should not be found\n");
        fx.write(nm.join("pkg").join("CLAUDE.md"), "# Nested\n");
        fx.write(fx.project().join(".git").join("CLAUDE.md"), "# VCS\n");
        fx.write(fx.project().join(".cache").join("CLAUDE.md"), "# Hidden\n");
        fx.write(fx.project().join("target").join("CLAUDE.md"), "# Build\n");

        let files = fx.find();
        assert!(files.is_empty(), "unexpected files: {:?}", files);
    }

    #[test]
    fn test_project_config_dir_is_walked() {
        let fx = Fixture::new();
        fx.write(fx.project().join(".claude").join("CLAUDE.md"), "# In config dir\n");

        let files = fx.find();
        assert_eq!(of_type(&files, FileType::Subdirectory).len(), 1);
    }

    #[test]
    fn test_custom_exclusions() {
        let fx = Fixture::new();
        fx.write(fx.project().join("node_modules").join("CLAUDE.md"), "# now visible\n");
        fx.write(fx.project().join("legacy").join("CLAUDE.md"), "# hidden\n");

        let discovery = fx.discovery.clone().with_excluded_dirs(["legacy"]);
        let files = discovery.find_claude_files(&fx.project());
        let subdirs: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
        assert_eq!(subdirs, vec!["./node_modules/CLAUDE.md"]);
    }

    #[test]
    fn test_memory_files_skip_rules() {
        let fx = Fixture::new();
        fx.write(fx.project().join("CLAUDE.md"), "# Root\n");
        fx.write(fx.project().join(".claude").join("rules").join("style.md"), "# Style\n");
        fx.write(fx.claude().join("rules").join("user.md"), "# User\n");

        let files = fx.discovery.find_memory_files(&fx.project());
        assert_eq!(files.len(), 1);
        assert!(files.iter().all(|f| f.file_type.is_memory_tier()));
    }

    #[test]
    fn test_no_duplicate_paths_when_home_is_project() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("CLAUDE.md"), "# Same file\n").unwrap();

        let discovery = Discovery::new(ClaudeHome::new(temp.path()));
        let files = discovery.find_claude_files(temp.path());
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_type, FileType::Global);
    }

    #[test]
    fn test_missing_directories_no_error() {
        let temp = TempDir::new().unwrap();
        let discovery = Discovery::new(ClaudeHome::new(temp.path().join("missing_claude")));
        assert!(discovery.find_claude_files(&temp.path().join("missing_project")).is_empty());
    }

    #[test]
    fn test_is_excluded_dir() {
        let excluded: Vec<String> = DEFAULT_EXCLUDED_DIRS.iter().map(|d| d.to_string()).collect();
        assert!(is_excluded_dir("node_modules", &excluded));
        assert!(is_excluded_dir(".git", &excluded));
        assert!(is_excluded_dir(".idea", &excluded));
        assert!(!is_excluded_dir(".claude", &excluded));
        assert!(!is_excluded_dir("src", &excluded));
    }

    #[test]
    fn test_file_type_strings() {
        assert_eq!(FileType::UserRule.as_str(), "user-rule");
        assert_eq!(FileType::Subdirectory.to_string(), "subdirectory");
        assert_eq!(serde_json::to_string(&FileType::UserRule).unwrap(), "\"user-rule\"");
        assert!(FileType::VALUES.iter().filter(|t| t.is_rule()).count() == 2);
        assert!(FileType::VALUES.iter().filter(|t| t.is_memory_tier()).count() == 4);
    }

    #[test]
    fn test_descriptor_serialization() {
        let descriptor = FileDescriptor::new(PathBuf::from("/p/CLAUDE.md"), "./CLAUDE.md", FileType::Root);
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["type"], "root");
        assert_eq!(json["relative_path"], "./CLAUDE.md");
        assert!(json.get("frontmatter").is_none());
    }
}
