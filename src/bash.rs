//! Embedded Bash Inspection - Advisory Only
//!
//! Syntax checks and hazard findings feed warnings, never errors. Every
//! environment-dependent failure of the external interpreter degrades to
//! "skipped" rather than blocking a build.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Read, Write};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::LazyLock;
use std::time::{Duration, Instant};

/// Fence marker must begin a line; the first closing fence ends the block.
static BASH_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^```(?:bash|sh)\n(.*?)\n```").unwrap());

pub const SYNTAX_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Extract fenced `bash`/`sh` blocks in document order, trimmed.
/// Blocks that trim to empty are dropped.
pub fn extract_blocks(content: &str) -> Vec<String> {
    BASH_FENCE_RE
        .captures_iter(content)
        .filter_map(|caps| {
            let block = caps.get(1).map_or("", |m| m.as_str()).trim();
            if block.is_empty() {
                None
            } else {
                Some(block.to_string())
            }
        })
        .collect()
}

/// Outcome of an external `bash -n` invocation.
///
/// `Skipped` is kept distinct from `Passed` even though the pipeline
/// currently treats both as non-failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxCheck {
    Passed,
    Failed(String),
    Skipped(String),
}

impl SyntaxCheck {
    pub fn is_failure(&self) -> bool {
        matches!(self, SyntaxCheck::Failed(_))
    }
}

/// Parse-only check of a script via `bash -n`, bounded by
/// [`SYNTAX_CHECK_TIMEOUT`].
pub fn check_syntax(script: &str) -> SyntaxCheck {
    check_syntax_with("bash", script, SYNTAX_CHECK_TIMEOUT)
}

pub fn check_syntax_with(interpreter: &str, script: &str, timeout: Duration) -> SyntaxCheck {
    let mut child = match Command::new(interpreter)
        .arg("-n")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            return SyntaxCheck::Skipped(format!("{interpreter} not available"));
        }
        Err(err) => return SyntaxCheck::Skipped(format!("failed to spawn {interpreter}: {err}")),
    };

    if let Some(mut stdin) = child.stdin.take() {
        // A write failure means the interpreter already exited; the exit
        // status below decides the outcome.
        let _ = stdin.write_all(script.as_bytes());
    }

    let status = match wait_with_timeout(&mut child, timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            let _ = child.kill();
            let _ = child.wait();
            return SyntaxCheck::Skipped(format!("timed out after {}s", timeout.as_secs()));
        }
        Err(err) => {
            let _ = child.kill();
            let _ = child.wait();
            return SyntaxCheck::Skipped(format!("wait failed: {err}"));
        }
    };

    if status.success() {
        return SyntaxCheck::Passed;
    }

    let mut stderr = String::new();
    if let Some(mut pipe) = child.stderr.take() {
        let _ = pipe.read_to_string(&mut stderr);
    }

    if stderr.trim().is_empty() {
        // Non-zero exit without diagnostics is an environment signal
        // (e.g. a broken shell shim), not a syntax verdict.
        SyntaxCheck::Skipped("interpreter exited non-zero with no diagnostics".to_string())
    } else {
        SyntaxCheck::Failed(stderr.trim_end().to_string())
    }
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        std::thread::sleep(Duration::from_millis(25));
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

/// One hazard category: a named set of regex patterns sharing a severity.
#[derive(Debug, Clone)]
pub struct HazardCategory {
    pub name: String,
    pub severity: Severity,
    pub patterns: Vec<Regex>,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HazardFinding {
    pub category: String,
    pub severity: Severity,
    pub pattern: String,
    pub description: String,
}

/// On-disk shape of the hazard rule file.
#[derive(Debug, Deserialize)]
struct HazardRulesFile {
    #[serde(default)]
    categories: BTreeMap<String, HazardCategoryFile>,
}

#[derive(Debug, Deserialize)]
struct HazardCategoryFile {
    #[serde(default)]
    severity: Severity,
    #[serde(default)]
    patterns: Vec<String>,
    #[serde(default)]
    description: String,
}

/// Pattern-based hazard rules, loaded from an optional JSON file.
#[derive(Debug, Clone, Default)]
pub struct HazardRuleSet {
    categories: Vec<HazardCategory>,
}

impl HazardRuleSet {
    /// Load rules from `path`. The file is best-effort configuration:
    /// absent, unreadable or unparseable input yields an empty rule set.
    pub fn load(path: &Path) -> Self {
        let Ok(raw) = fs::read_to_string(path) else {
            return Self::default();
        };
        let Ok(file) = serde_json::from_str::<HazardRulesFile>(&raw) else {
            return Self::default();
        };

        let mut rules = Self::default();
        for (name, category) in file.categories {
            rules.insert(HazardCategory {
                name,
                severity: category.severity,
                // Non-compiling patterns are dropped, same policy as an
                // unreadable file.
                patterns: category
                    .patterns
                    .iter()
                    .filter_map(|p| Regex::new(p).ok())
                    .collect(),
                description: category.description,
            });
        }
        rules
    }

    pub fn insert(&mut self, category: HazardCategory) {
        self.categories.push(category);
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Match `script` against every pattern of every category, in rule-set
    /// order. One finding per matching pattern; no deduplication.
    pub fn scan(&self, script: &str) -> Vec<HazardFinding> {
        let mut findings = vec![];
        for category in &self.categories {
            for pattern in &category.patterns {
                if pattern.is_match(script) {
                    findings.push(HazardFinding {
                        category: category.name.clone(),
                        severity: category.severity,
                        pattern: pattern.as_str().to_string(),
                        description: category.description.clone(),
                    });
                }
            }
        }
        findings
    }
}
