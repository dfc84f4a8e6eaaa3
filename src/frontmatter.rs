//! YAML Frontmatter - Anchored Extraction and Parsing

use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::sync::LazyLock;
use thiserror::Error;

/// Frontmatter must open the document at byte 0; a delimiter pair later in
/// the body is not a header. The lazy body group stops at the first closing
/// delimiter line.
static FRONTMATTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\A---\s*\n(.*?)\n---\s*\n").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrontmatterError {
    #[error("Missing YAML frontmatter (must start with ---)")]
    Missing,

    #[error("Invalid YAML frontmatter: {0}")]
    Malformed(String),
}

/// A parsed metadata header. Derived fresh from one rendered document,
/// never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    fields: Mapping,
}

impl Frontmatter {
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(&Value::String(field.to_string()))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(&Value::String(field.to_string()))
    }

    /// Scalar field rendered as a string, `None` for lists and mappings.
    pub fn get_str(&self, field: &str) -> Option<String> {
        self.get(field).and_then(scalar_to_string)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Split a rendered document into its frontmatter and remaining body.
pub fn parse(content: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let caps = FRONTMATTER_RE
        .captures(content)
        .ok_or(FrontmatterError::Missing)?;

    let raw = caps.get(1).map_or("", |m| m.as_str());
    let parsed: Value = serde_yaml::from_str(raw)
        .map_err(|e| FrontmatterError::Malformed(e.to_string()))?;

    let fields = match parsed {
        Value::Mapping(mapping) => mapping,
        _ => {
            return Err(FrontmatterError::Malformed(
                "frontmatter is not a key-value mapping".to_string(),
            ))
        }
    };

    let body_start = caps.get(0).map_or(0, |m| m.end());
    Ok((Frontmatter { fields }, &content[body_start..]))
}
