//! Validation System - Hard Errors vs Advisory Warnings
//!
//! Errors fail a build. Warnings are surfaced for operator visibility and
//! never affect the verdict.

use serde::{Deserialize, Serialize};

use crate::bash::{self, HazardFinding, HazardRuleSet, Severity};
use crate::config::ValidationRules;
use crate::frontmatter::{self, scalar_to_string, Frontmatter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn failure(errors: Vec<String>) -> Self {
        Self {
            valid: false,
            errors,
            warnings: vec![],
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Approximate token cost: `floor(word_count * 1.3)`, splitting on runs of
/// whitespace. Deterministic, not tied to any particular tokenizer.
pub fn estimate_tokens(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    (words as f64 * 1.3) as u32
}

/// Blunt substring check for leftover template delimiters. Literal `{{` or
/// `{%` in prose is flagged too; that is accepted behavior.
pub fn has_unresolved_syntax(content: &str) -> bool {
    content.contains("{{") || content.contains("{%")
}

pub fn check_required_fields(header: &Frontmatter, rules: &ValidationRules) -> Vec<String> {
    rules
        .required_frontmatter
        .iter()
        .filter(|field| !header.contains(field))
        .map(|field| format!("Missing required frontmatter field: {field}"))
        .collect()
}

pub fn check_allowed_values(header: &Frontmatter, rules: &ValidationRules) -> Vec<String> {
    let mut errors = vec![];
    for (field, allowed) in &rules.allowed_values {
        let Some(value) = header.get(field) else {
            continue;
        };
        let actual = scalar_to_string(value).unwrap_or_else(|| {
            serde_yaml::to_string(value)
                .unwrap_or_default()
                .trim()
                .to_string()
        });
        if !allowed.contains(&actual) {
            errors.push(format!(
                "Invalid {field} '{actual}'. Allowed: {}",
                allowed.join(", ")
            ));
        }
    }
    errors
}

/// Validates a rendered document end to end.
///
/// A missing or malformed header short-circuits; all other checks
/// accumulate into one report.
pub struct Validator {
    rules: ValidationRules,
    hazards: HazardRuleSet,
}

impl Validator {
    pub fn new(rules: ValidationRules, hazards: HazardRuleSet) -> Self {
        Self { rules, hazards }
    }

    pub fn validate(&self, content: &str) -> ValidationResult {
        let header = match frontmatter::parse(content) {
            Ok((header, _body)) => header,
            Err(err) => return ValidationResult::failure(vec![err.to_string()]),
        };

        let mut errors = vec![];
        let mut warnings = vec![];

        errors.extend(check_required_fields(&header, &self.rules));
        errors.extend(check_allowed_values(&header, &self.rules));

        if has_unresolved_syntax(content) {
            errors.push(
                "Unresolved template syntax found in output (template compilation incomplete)"
                    .to_string(),
            );
        }

        let tokens = estimate_tokens(content);
        if tokens > self.rules.max_tokens {
            errors.push(format!(
                "Token count {tokens} exceeds limit of {}",
                self.rules.max_tokens
            ));
        }

        for (i, block) in bash::extract_blocks(content).iter().enumerate() {
            let index = i + 1;

            if let bash::SyntaxCheck::Failed(message) = bash::check_syntax(block) {
                warnings.push(format!("Bash block {index} syntax error: {message}"));
            }

            // Only critical findings become warnings; the rest are kept
            // for callers that want the full report.
            for finding in self.critical_findings(block) {
                warnings.push(format!(
                    "Bash block {index}: CRITICAL - {}",
                    finding.description
                ));
            }
        }

        ValidationResult {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    pub fn scan_hazards(&self, script: &str) -> Vec<HazardFinding> {
        self.hazards.scan(script)
    }

    fn critical_findings(&self, script: &str) -> Vec<HazardFinding> {
        self.hazards
            .scan(script)
            .into_iter()
            .filter(|finding| finding.severity == Severity::Critical)
            .collect()
    }
}
