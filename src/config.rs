//! Build Configuration - Typed, Fail-Fast

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML in config: {0}")]
    Malformed(#[from] serde_yaml::Error),
}

/// Build configuration, loaded once at startup and read-only after.
///
/// Every section is an explicit typed record; a shape mismatch fails at
/// load time, never at first field access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    pub build: BuildPaths,
    pub validation: ValidationRules,
    #[serde(default)]
    pub templates: TemplateNaming,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildPaths {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub skills_dir: Option<PathBuf>,
}

/// Hard validation constraints applied to every rendered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRules {
    pub max_tokens: u32,
    /// Required frontmatter fields, checked in declared order.
    pub required_frontmatter: Vec<String>,
    /// Per-field allowed value lists (e.g. `model: [sonnet, haiku, opus]`).
    #[serde(default)]
    pub allowed_values: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateNaming {
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default = "default_output_extension")]
    pub output_extension: String,
}

impl Default for TemplateNaming {
    fn default() -> Self {
        Self {
            file_extension: default_file_extension(),
            output_extension: default_output_extension(),
        }
    }
}

fn default_file_extension() -> String {
    ".md.j2".to_string()
}

fn default_output_extension() -> String {
    ".md".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default = "default_true")]
    pub show_warnings: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            show_warnings: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&raw)?;
        Ok(config)
    }
}
