//! Learning classification and destination routing
//!
//! A learning is routed with a small ordered rule table: the first rule that applies wins.
//!
//! 1. Guardrails go to `.claude/rules/guardrails.md` (created on demand by the caller).
//! 2. A learning that mentions a path declared in a rule file's `paths` goes to that rule.
//! 3. Keyword categories pick the global or project memory file.
//! 4. Anything else is ambiguous (`None`): the caller asks the user or falls back to auto-memory.
//!
//! Routing is pure: it only looks at the text and the inventory it is given.

use crate::discovery::{FileDescriptor, FileType};
use crate::error::Error;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// File name of the guardrails rule file
pub const GUARDRAILS_FILE: &str = "guardrails.md";

/// Where a guardrails file is suggested when none exists yet
pub const GUARDRAILS_PATH: &str = "./.claude/rules/guardrails.md";

/// Display path of the global memory file, used when it is not in the inventory
pub const GLOBAL_MEMORY_PATH: &str = "~/.claude/CLAUDE.md";

/// Display path of the project memory file, used when it is not in the inventory
pub const ROOT_MEMORY_PATH: &str = "./CLAUDE.md";

/// Fallback auto-memory topic
pub const DEFAULT_TOPIC: &str = "general";

/// A named keyword category
#[derive(Debug, Clone, Copy)]
pub struct Category {
    pub name: &'static str,
    /// Matched case-insensitively at the start of a word (`test` matches `tests`, not `latest`)
    pub keywords: &'static [&'static str],
    /// Also match model version tokens such as `gpt-5.1`
    pub version_tokens: bool,
}

pub const MODEL_PREFERENCES: Category = Category {
    name: "model-preferences",
    keywords: &["model", "gpt", "opus", "sonnet", "haiku", "gemini", "llm", "reasoning", "thinking budget"],
    version_tokens: true,
};

pub const TOOL_USAGE: Category = Category {
    name: "tool-usage",
    keywords: &["tool", "plugin", "mcp", "extension", "hook", "slash command", "skill"],
    version_tokens: false,
};

pub const ENVIRONMENT: Category = Category {
    name: "environment",
    keywords: &[
        "venv",
        "virtualenv",
        "virtual env",
        "conda",
        "pyenv",
        "nvm",
        "interpreter",
        "environment",
        "env var",
        "python version",
        "node version",
        "shell profile",
    ],
    version_tokens: false,
};

pub const WORKFLOW: Category = Category {
    name: "workflow",
    keywords: &[
        "test",
        "deploy",
        "workflow",
        "commit",
        "pull request",
        "code review",
        "release",
        "ci/cd",
        "pipeline",
        "lint",
        "before merging",
    ],
    version_tokens: false,
};

/// Phrases that pin a learning to the current project
pub const PROJECT_SCOPE: Category = Category {
    name: "project-scope",
    keywords: &["this project", "this repo", "this codebase", "our codebase", "this app", "in this directory"],
    version_tokens: false,
};

/// Auto-memory topics, first match wins
pub const TOPIC_RULES: &[Category] = &[MODEL_PREFERENCES, TOOL_USAGE, ENVIRONMENT, WORKFLOW];

/// Memory file a category routes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    /// `~/.claude/CLAUDE.md`
    Global,
    /// `./CLAUDE.md`
    Project,
}

/// Category routing after guardrail and path-scope checks, first match wins
pub const ROUTE_RULES: &[(Category, Tier)] = &[
    (MODEL_PREFERENCES, Tier::Global),
    (PROJECT_SCOPE, Tier::Project),
    (ENVIRONMENT, Tier::Global),
    (TOOL_USAGE, Tier::Global),
    (WORKFLOW, Tier::Project),
];

/// Kind of learning, as reported by the extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LearningType {
    /// "Don't do X" constraints
    Guardrail,
    /// A correction of something the assistant got wrong
    Correction,
    /// A stated preference
    Preference,
}

impl LearningType {
    pub const VALUES: &[LearningType] = &[LearningType::Guardrail, LearningType::Correction, LearningType::Preference];

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningType::Guardrail => "guardrail",
            LearningType::Correction => "correction",
            LearningType::Preference => "preference",
        }
    }
}

impl std::fmt::Display for LearningType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LearningType {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        LearningType::VALUES
            .iter()
            .copied()
            .find(|t| t.as_str() == lowered)
            .ok_or_else(|| Error::InvalidLearningType(s.to_string()))
    }
}

/// Why a destination was chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RouteReason {
    Guardrail,
    /// The learning mentions a path declared by the rule file
    PathScope { pattern: String },
    /// A keyword category matched
    Category { name: String, tier: Tier },
}

impl std::fmt::Display for RouteReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteReason::Guardrail => write!(f, "guardrail"),
            RouteReason::PathScope { pattern } => write!(f, "path scope '{}'", pattern),
            RouteReason::Category { name, .. } => write!(f, "category '{}'", name),
        }
    }
}

/// A routing decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Display path of the destination file (may not exist yet)
    pub path: String,
    pub reason: RouteReason,
    /// Coarse confidence in `0.0..=1.0`
    pub confidence: f32,
}

/// Suggest an auto-memory topic for a learning
pub fn suggest_auto_memory_topic(text: &str) -> &'static str {
    let text = text.to_lowercase();
    TOPIC_RULES
        .iter()
        .find(|category| category_hits(category, &text) > 0)
        .map_or(DEFAULT_TOPIC, |category| category.name)
}

/// Suggest the destination file for a learning
///
/// Returns the display path of the destination, or `None` when the learning is ambiguous.
pub fn suggest_claude_file(
    text: &str, files: &[FileDescriptor], learning_type: Option<LearningType>,
) -> Option<String> {
    route_learning(text, files, learning_type).map(|route| route.path)
}

/// Route a learning, keeping the reason for the decision
pub fn route_learning(text: &str, files: &[FileDescriptor], learning_type: Option<LearningType>) -> Option<Route> {
    if learning_type == Some(LearningType::Guardrail) {
        let path = files
            .iter()
            .find(|f| f.file_type == FileType::Rule && f.file_name() == Some(GUARDRAILS_FILE))
            .map_or_else(|| GUARDRAILS_PATH.to_string(), |f| f.relative_path.clone());
        return Some(Route { path, reason: RouteReason::Guardrail, confidence: 1.0 });
    }

    let lowered = text.to_lowercase();

    if let Some(route) = route_by_path_scope(&lowered, files) {
        return Some(route);
    }

    for (category, tier) in ROUTE_RULES {
        let hits = category_hits(category, &lowered);
        if hits == 0 {
            continue;
        }

        let path = tier_path(*tier, files);
        let confidence = (0.5 + 0.1 * hits as f32).min(0.8);
        tracing::debug!("Routed learning to {} via category {}", path, category.name);
        return Some(Route {
            path,
            reason: RouteReason::Category { name: category.name.to_string(), tier: *tier },
            confidence,
        });
    }

    None
}

fn route_by_path_scope(lowered: &str, files: &[FileDescriptor]) -> Option<Route> {
    let tokens = path_tokens(lowered);

    for file in files.iter().filter(|f| f.file_type.is_rule()) {
        for pattern in file.scoped_paths() {
            let scope = normalize_path(&pattern.to_lowercase());
            if scope.is_empty() {
                continue;
            }

            let mentioned = contains_path(lowered, &scope)
                || tokens
                    .iter()
                    .any(|token| is_path_prefix(token, &scope) || is_path_prefix(&scope, token));

            if mentioned {
                return Some(Route {
                    path: file.relative_path.clone(),
                    reason: RouteReason::PathScope { pattern },
                    confidence: 0.9,
                });
            }
        }
    }

    None
}

fn tier_path(tier: Tier, files: &[FileDescriptor]) -> String {
    let (file_type, fallback) = match tier {
        Tier::Global => (FileType::Global, GLOBAL_MEMORY_PATH),
        Tier::Project => (FileType::Root, ROOT_MEMORY_PATH),
    };

    files
        .iter()
        .find(|f| f.file_type == file_type)
        .map_or_else(|| fallback.to_string(), |f| f.relative_path.clone())
}

/// Number of keyword (and version token) hits of a category in lowercased text
fn category_hits(category: &Category, lowered: &str) -> usize {
    let keywords = category
        .keywords
        .iter()
        .filter(|keyword| contains_word_prefix(lowered, keyword))
        .count();

    let versions = if category.version_tokens { version_regex().find_iter(lowered).count() } else { 0 };

    keywords + versions
}

fn version_regex() -> &'static Regex {
    static VERSION_TOKEN: OnceLock<Regex> = OnceLock::new();
    VERSION_TOKEN.get_or_init(|| {
        Regex::new(r"\b(?:gpt|glm|claude|gemini|llama|qwen|mistral|o)-?\d+(?:\.\d+)*\b").expect("valid version regex")
    })
}

/// `needle` occurs where a word starts
fn contains_word_prefix(haystack: &str, needle: &str) -> bool {
    haystack
        .match_indices(needle)
        .any(|(i, _)| starts_word(haystack, i))
}

/// `path` occurs as a whole path (not inside a longer name)
fn contains_path(haystack: &str, path: &str) -> bool {
    haystack.match_indices(path).any(|(i, _)| {
        let end = i + path.len();
        starts_word(haystack, i) && haystack[end..].chars().next().is_none_or(|c| !c.is_alphanumeric())
    })
}

fn starts_word(haystack: &str, i: usize) -> bool {
    haystack[..i].chars().next_back().is_none_or(|c| !c.is_alphanumeric())
}

/// `prefix` equals `path` or is a leading run of its segments
fn is_path_prefix(prefix: &str, path: &str) -> bool {
    path == prefix || (path.starts_with(prefix) && path[prefix.len()..].starts_with('/'))
}

/// Path-like words of the text (containing `/`), normalized
fn path_tokens(lowered: &str) -> Vec<String> {
    lowered
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| ",.;:!?()[]{}\"'`".contains(c)))
        .filter(|word| word.contains('/'))
        .map(normalize_path)
        .filter(|word| !word.is_empty())
        .collect()
}

/// Drop `./`, glob tails and trailing slashes: `./src/api/**` becomes `src/api`
fn normalize_path(path: &str) -> String {
    let path = path.trim();
    let path = path.split('*').next().unwrap_or_default();
    let path = path.strip_prefix("./").unwrap_or(path);
    path.trim_end_matches('/').to_string()
}
