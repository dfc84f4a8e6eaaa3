//! AgentForge Core - Agent Production Compiler
//!
//! Compiles parameterized agent templates into validated, production-ready
//! agent documents.
//!
//! # The Build Laws (Non-Negotiable)
//! 1. Templates Are Source, dist/ Is Output
//! 2. Every Rendered Document Is Validated
//! 3. Hard Errors Fail, Warnings Inform
//! 4. Bash Inspection Is Advisory
//! 5. Configuration Loads Fail-Fast

pub mod bash;
pub mod config;
pub mod console;
pub mod frontmatter;
pub mod pipeline;
pub mod render;
pub mod validation;

pub use bash::{HazardCategory, HazardFinding, HazardRuleSet, Severity, SyntaxCheck};
pub use config::{BuildConfig, ConfigError, ValidationRules};
pub use frontmatter::{Frontmatter, FrontmatterError};
pub use pipeline::{BuildPipeline, BuildStats, PipelineError};
pub use render::{BuildContext, RenderError, Renderer};
pub use validation::{ValidationResult, Validator};

pub const BUILDER_VERSION: &str = env!("CARGO_PKG_VERSION");
