//! Contract Invariant Tests
//!
//! These tests verify the validation layer's non-negotiable guarantees:
//! hard errors fail a document, warnings never do, and results are
//! deterministic for identical input.

use regex::Regex;
use std::collections::BTreeMap;

use agentforge_core::bash::{self, HazardCategory, HazardRuleSet, Severity, SyntaxCheck};
use agentforge_core::config::ValidationRules;
use agentforge_core::frontmatter::{self, FrontmatterError};
use agentforge_core::validation::{estimate_tokens, Validator};

fn rules() -> ValidationRules {
    ValidationRules {
        max_tokens: 2500,
        required_frontmatter: ["name", "description", "tools", "model"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        allowed_values: BTreeMap::from([(
            "model".to_string(),
            ["sonnet", "haiku", "opus"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )]),
    }
}

fn validator() -> Validator {
    Validator::new(rules(), HazardRuleSet::default())
}

fn hazard_rules() -> HazardRuleSet {
    let mut hazards = HazardRuleSet::default();
    hazards.insert(HazardCategory {
        name: "destructive_filesystem".to_string(),
        severity: Severity::Critical,
        patterns: vec![Regex::new(r"rm\s+-rf\s+/").unwrap()],
        description: "Commands that can destroy filesystem".to_string(),
    });
    hazards
}

const VALID_DOC: &str = "---\n\
name: test-agent\n\
description: Test agent for unit testing\n\
tools: Read, Grep, Glob\n\
model: sonnet\n\
---\n\
\n\
# Identity\n\
\n\
You are a test agent.\n";

#[test]
fn invariant_valid_document_passes() {
    let result = validator().validate(VALID_DOC);
    assert!(result.valid);
    assert!(result.errors.is_empty());
}

#[test]
fn invariant_missing_frontmatter_short_circuits() {
    let result = validator().validate("# no header");
    assert!(!result.valid);
    assert_eq!(
        result.errors,
        vec!["Missing YAML frontmatter (must start with ---)".to_string()]
    );
    assert!(result.warnings.is_empty());
}

#[test]
fn invariant_malformed_frontmatter_short_circuits() {
    let doc = "---\nname: [unclosed\n---\n\nbody\n";
    let result = validator().validate(doc);
    assert!(!result.valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].starts_with("Invalid YAML frontmatter:"));
}

#[test]
fn missing_required_fields_accumulate() {
    let doc = "---\nname: partial\ndescription: Missing tools and model\n---\n\nbody\n";
    let result = validator().validate(doc);
    assert!(!result.valid);
    assert!(result
        .errors
        .contains(&"Missing required frontmatter field: tools".to_string()));
    assert!(result
        .errors
        .contains(&"Missing required frontmatter field: model".to_string()));
}

#[test]
fn invalid_enum_value_reports_allowed_set() {
    let doc = "---\n\
name: bad-model\n\
description: Wrong model\n\
tools: Read\n\
model: gpt-4\n\
---\n\
\n\
body\n";
    let result = validator().validate(doc);
    assert!(!result.valid);
    assert!(result
        .errors
        .contains(&"Invalid model 'gpt-4'. Allowed: sonnet, haiku, opus".to_string()));
}

#[test]
fn unresolved_placeholder_fails_validation() {
    let doc = format!("{VALID_DOC}\nLeftover {{{{ variable }}}} here.\n");
    let result = validator().validate(&doc);
    assert!(!result.valid);
    assert!(result.errors.iter().any(|e| e.contains("Unresolved")));
}

#[test]
fn token_budget_overflow_fails_validation() {
    let body = vec!["word"; 2100].join(" ");
    let doc = format!("{VALID_DOC}\n{body}\n");
    let result = validator().validate(&doc);
    assert!(!result.valid);
    assert!(result
        .errors
        .iter()
        .any(|e| e.contains("exceeds limit of 2500")));
}

#[test]
fn invariant_validation_is_idempotent() {
    let doc = format!("{VALID_DOC}\n```bash\nrm -rf /\n```\n");
    let validator = Validator::new(rules(), hazard_rules());
    let first = validator.validate(&doc);
    let second = validator.validate(&doc);
    assert_eq!(first, second);
}

#[test]
fn estimate_tokens_matches_word_count_formula() {
    assert_eq!(estimate_tokens(""), 0);
    assert_eq!(estimate_tokens("   \n\t  "), 0);
    for n in [1usize, 10, 100, 2100] {
        let text = vec!["word"; n].join(" ");
        assert_eq!(estimate_tokens(&text), (n as f64 * 1.3) as u32);
    }
}

#[test]
fn extraction_preserves_document_order() {
    let doc = "intro\n\
```bash\necho first\n```\n\
prose between\n\
```sh\necho second\n```\n\
outro\n";
    let blocks = bash::extract_blocks(doc);
    assert_eq!(
        blocks,
        vec!["echo first".to_string(), "echo second".to_string()]
    );
}

#[test]
fn extraction_drops_whitespace_only_blocks() {
    let doc = "```bash\n   \n```\n";
    assert!(bash::extract_blocks(doc).is_empty());
}

#[test]
fn extraction_requires_fence_at_line_start() {
    let doc = "prose ```bash\necho hidden\n```\n";
    assert!(bash::extract_blocks(doc).is_empty());
}

#[test]
fn extraction_ignores_untagged_fences() {
    let doc = "```python\nprint('hi')\n```\n\n```\nplain\n```\n";
    assert!(bash::extract_blocks(doc).is_empty());
}

#[test]
fn hazard_scan_matches_critical_pattern() {
    let findings = hazard_rules().scan("rm -rf /");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::Critical);
    assert_eq!(findings[0].category, "destructive_filesystem");
}

#[test]
fn hazard_scan_ignores_relative_paths() {
    assert!(hazard_rules().scan("rm -rf ./build").is_empty());
}

#[test]
fn hazard_scan_does_not_deduplicate() {
    let mut hazards = hazard_rules();
    hazards.insert(HazardCategory {
        name: "filesystem_writes".to_string(),
        severity: Severity::Medium,
        patterns: vec![Regex::new(r"\brm\b").unwrap(), Regex::new(r"-rf").unwrap()],
        description: "File removal".to_string(),
    });
    let findings = hazards.scan("rm -rf /tmp/scratch");
    assert_eq!(findings.len(), 3);
}

#[test]
fn empty_rule_set_never_finds_anything() {
    assert!(HazardRuleSet::default().scan("rm -rf /").is_empty());
}

#[test]
fn invariant_warnings_never_fail_validation() {
    let doc = format!("{VALID_DOC}\n```bash\nrm -rf /\n```\n");
    let validator = Validator::new(rules(), hazard_rules());
    let result = validator.validate(&doc);
    assert!(result.valid);
    assert_eq!(
        result.warnings,
        vec!["Bash block 1: CRITICAL - Commands that can destroy filesystem".to_string()]
    );
}

#[test]
fn non_critical_findings_are_recorded_not_surfaced() {
    let mut hazards = HazardRuleSet::default();
    hazards.insert(HazardCategory {
        name: "system_modification".to_string(),
        severity: Severity::High,
        patterns: vec![Regex::new(r"chmod\s+-R\s+777").unwrap()],
        description: "Commands that modify system security".to_string(),
    });
    let validator = Validator::new(rules(), hazards);

    let doc = format!("{VALID_DOC}\n```bash\nchmod -R 777 /var/www\n```\n");
    let result = validator.validate(&doc);
    assert!(result.valid);
    assert!(result.warnings.is_empty());

    let findings = validator.scan_hazards("chmod -R 777 /var/www");
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].severity, Severity::High);
}

#[test]
fn syntax_check_accepts_valid_script() {
    let result = bash::check_syntax("echo hello\nls -la");
    assert!(!result.is_failure());
}

#[test]
fn syntax_check_never_passes_broken_script() {
    // Failed when bash is present, Skipped when it is not; never Passed.
    let result = bash::check_syntax("if [ 1 -eq 1 ]; then\necho unterminated");
    assert_ne!(result, SyntaxCheck::Passed);
}

#[test]
fn syntax_check_skips_missing_interpreter() {
    let result = bash::check_syntax_with(
        "agentforge-no-such-interpreter",
        "echo hi",
        std::time::Duration::from_secs(5),
    );
    assert!(matches!(result, SyntaxCheck::Skipped(_)));
}

#[test]
fn frontmatter_splits_header_and_body() {
    let (header, body) = frontmatter::parse(VALID_DOC).unwrap();
    assert!(header.contains("name"));
    assert_eq!(header.get_str("model").as_deref(), Some("sonnet"));
    // The closing delimiter match swallows trailing blank lines.
    assert!(body.starts_with("# Identity"));
}

#[test]
fn frontmatter_only_matches_document_start() {
    let doc = "# Title\n---\nname: late\n---\n";
    assert_eq!(frontmatter::parse(doc), Err(FrontmatterError::Missing));
}

#[test]
fn frontmatter_rejects_non_mapping_header() {
    let doc = "---\njust a string\n---\n\nbody\n";
    assert!(matches!(
        frontmatter::parse(doc),
        Err(FrontmatterError::Malformed(_))
    ));
}
