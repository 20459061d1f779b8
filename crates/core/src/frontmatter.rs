//! Rule file frontmatter parsing
//!
//! Rule files may start with a small header block:
//!
//! ```markdown
//! ---
//! description: API conventions
//! paths:
//!   - "src/api/"
//!   - 'lib/utils/'
//! ---
//!
//! # API Rules
//! ```
//!
//! Only flat `key: value` scalars and one level of `key:` followed by `- item` lines are
//! understood. Anything that does not fit that shape is skipped line by line, and a header
//! that is missing, unterminated or empty parses to `None`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Header delimiter line
pub const DELIMITER: &str = "---";

/// Key holding the path scope of a rule file
pub const PATHS_KEY: &str = "paths";

/// A single frontmatter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrontmatterValue {
    /// `key:` followed by `- item` lines
    List(Vec<String>),
    /// `key: value`
    Scalar(String),
}

/// Parsed frontmatter header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frontmatter {
    entries: BTreeMap<String, FrontmatterValue>,
}

impl Frontmatter {
    pub fn get(&self, key: &str) -> Option<&FrontmatterValue> {
        self.entries.get(key)
    }

    /// Get a scalar value, `None` if absent or list-valued
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            FrontmatterValue::Scalar(value) => Some(value),
            FrontmatterValue::List(_) => None,
        }
    }

    /// Get a list value, `None` if absent or scalar
    pub fn list(&self, key: &str) -> Option<&[String]> {
        match self.entries.get(key)? {
            FrontmatterValue::List(items) => Some(items),
            FrontmatterValue::Scalar(_) => None,
        }
    }

    /// Declared path scope of a rule file
    ///
    /// A scalar `paths: a, b` is accepted as a comma-separated list.
    pub fn paths(&self) -> Vec<String> {
        match self.entries.get(PATHS_KEY) {
            Some(FrontmatterValue::List(items)) => items.clone(),
            Some(FrontmatterValue::Scalar(value)) => value
                .split(',')
                .map(|p| strip_quotes(p.trim()).to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parse the frontmatter of a rule file on disk
///
/// Unreadable files are treated exactly like files without a header.
pub fn parse_rule_frontmatter(path: &Path) -> Option<Frontmatter> {
    match fs::read_to_string(path) {
        Ok(content) => parse_frontmatter_str(&content),
        Err(e) => {
            tracing::debug!("Skipping frontmatter of {}: {}", path.display(), e);
            None
        }
    }
}

/// Parse frontmatter from file content
pub fn parse_frontmatter_str(content: &str) -> Option<Frontmatter> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content.lines();

    if lines.next()?.trim_end() != DELIMITER {
        return None;
    }

    let mut block = Vec::new();
    let mut closed = false;
    for line in lines {
        if line.trim_end() == DELIMITER {
            closed = true;
            break;
        }
        block.push(line);
    }

    if !closed || block.iter().all(|line| line.trim().is_empty()) {
        return None;
    }

    Some(parse_block(&block))
}

enum State<'a> {
    Scanning,
    Collecting { key: &'a str, items: Vec<String> },
}

fn parse_block<'a>(block: &[&'a str]) -> Frontmatter {
    let mut entries = BTreeMap::new();
    let mut state = State::Scanning;

    for &line in block {
        if line.trim().is_empty() {
            continue;
        }

        if let State::Collecting { items, .. } = &mut state {
            if let Some(item) = list_item(line) {
                if !item.is_empty() {
                    items.push(item.to_string());
                }
                continue;
            }

            if let State::Collecting { key, items } = std::mem::replace(&mut state, State::Scanning) {
                entries.insert(key.to_string(), FrontmatterValue::List(items));
            }
        }

        let Some((key, value)) = key_value(line) else {
            continue;
        };

        if value.is_empty() {
            state = State::Collecting { key, items: Vec::new() };
        } else {
            entries.insert(key.to_string(), FrontmatterValue::Scalar(strip_quotes(value).to_string()));
        }
    }

    if let State::Collecting { key, items } = state {
        entries.insert(key.to_string(), FrontmatterValue::List(items));
    }

    Frontmatter { entries }
}

/// `- value` (any indentation), quotes stripped
fn list_item(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    let rest = if trimmed == "-" { "" } else { trimmed.strip_prefix("- ")? };
    Some(strip_quotes(rest.trim()))
}

/// `key: value` or `key:`, value trimmed
fn key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();

    if key.is_empty() || !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return None;
    }

    Some((key, value.trim()))
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2
            && let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
