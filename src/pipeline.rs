//! Build Pipeline - Single Entry Point
//!
//! CRITICAL: compile_template MUST validate rendered output. No bypass.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::bash::HazardRuleSet;
use crate::config::BuildConfig;
use crate::console;
use crate::render::{BuildContext, RenderError, Renderer};
use crate::validation::{ValidationResult, Validator};

#[cfg(feature = "test-hooks")]
use std::sync::atomic::{AtomicU32, Ordering};

#[cfg(feature = "test-hooks")]
static VALIDATION_CALL_COUNT: AtomicU32 = AtomicU32::new(0);

#[cfg(feature = "test-hooks")]
pub fn get_validation_call_count() -> u32 {
    VALIDATION_CALL_COUNT.load(Ordering::SeqCst)
}

#[cfg(feature = "test-hooks")]
pub fn reset_validation_call_count() {
    VALIDATION_CALL_COUNT.store(0, Ordering::SeqCst);
}

/// Hazard rules live next to the build config; the file is optional.
pub const HAZARD_RULES_PATH: &str = "config/dangerous_commands.json";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to read source directory {0}: {1}")]
    SourceDir(PathBuf, std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Failed to write output {0}: {1}")]
    WriteOutput(PathBuf, std::io::Error),
}

/// Per-batch counters. Owned by the pipeline value; constructing a new
/// pipeline starts a fresh batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub total: u32,
    pub success: u32,
    pub failed: u32,
    pub warnings: u32,
}

/// The build pipeline - renders templates, validates the output, and
/// writes accepted documents to the output directory.
pub struct BuildPipeline {
    root_dir: PathBuf,
    config: BuildConfig,
    renderer: Renderer,
    validator: Validator,
    stats: BuildStats,
}

impl BuildPipeline {
    pub fn new(root_dir: &Path, config: BuildConfig, context: BuildContext) -> Self {
        // Template names resolve against the parent of source_dir so that
        // includes like 'skills/common/x.md' work from agent templates.
        let template_root = root_dir.join(
            config
                .build
                .source_dir
                .parent()
                .unwrap_or_else(|| Path::new("")),
        );
        let renderer = Renderer::new(&template_root, context);

        let hazards = HazardRuleSet::load(&root_dir.join(HAZARD_RULES_PATH));
        let validator = Validator::new(config.validation.clone(), hazards);

        Self {
            root_dir: root_dir.to_path_buf(),
            config,
            renderer,
            validator,
            stats: BuildStats::default(),
        }
    }

    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Find all templates in the source directory, sorted for a
    /// deterministic build order. A missing directory yields an empty list.
    pub fn discover_templates(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let source_dir = self.root_dir.join(&self.config.build.source_dir);
        if !source_dir.is_dir() {
            return Ok(vec![]);
        }

        let entries = fs::read_dir(&source_dir)
            .map_err(|e| PipelineError::SourceDir(source_dir.clone(), e))?;

        let mut templates = vec![];
        for entry in entries {
            let entry = entry.map_err(|e| PipelineError::SourceDir(source_dir.clone(), e))?;
            let path = entry.path();
            let is_template = path.is_file()
                && path.file_name().map_or(false, |name| {
                    name.to_string_lossy()
                        .ends_with(&self.config.templates.file_extension)
                });
            if is_template {
                templates.push(path);
            }
        }
        templates.sort();
        Ok(templates)
    }

    /// Render and validate a single template without writing output.
    pub fn validate_template(
        &self,
        template_path: &Path,
    ) -> Result<ValidationResult, PipelineError> {
        let rendered = self.render_template(template_path)?;
        Ok(self.validate_rendered(&rendered))
    }

    /// Render, validate and write a single template.
    ///
    /// Validation is ALWAYS applied to the rendered output before anything
    /// is written.
    pub fn compile_template(&mut self, template_path: &Path) -> Result<PathBuf, PipelineError> {
        let rendered = self.render_template(template_path)?;

        let result = self.validate_rendered(&rendered);
        self.report_warnings(&result);
        if !result.valid {
            return Err(PipelineError::ValidationFailed(result.errors));
        }

        let output_dir = self.root_dir.join(&self.config.build.output_dir);
        fs::create_dir_all(&output_dir)
            .map_err(|e| PipelineError::WriteOutput(output_dir.clone(), e))?;

        let output_path = output_dir.join(self.output_name(template_path));
        fs::write(&output_path, &rendered)
            .map_err(|e| PipelineError::WriteOutput(output_path.clone(), e))?;

        Ok(output_path)
    }

    /// Compile (or, with `validate_only`, just check) every discovered
    /// template. Per-document failures are recorded and the batch
    /// continues; the aggregate outcome is the returned stats.
    pub fn build_all(&mut self, validate_only: bool) -> BuildStats {
        console::info("\n[BUILD] AgentForge Build System");
        console::info(&"=".repeat(50));

        let templates = match self.discover_templates() {
            Ok(templates) => templates,
            Err(err) => {
                console::error(&format!("[ERROR] {err}"));
                self.stats.failed += 1;
                return self.stats;
            }
        };

        if templates.is_empty() {
            console::warning("\n[WARN] No templates to build");
            return self.stats;
        }

        console::info(&format!("\nBuilding {} agent(s)...\n", templates.len()));

        for template_path in &templates {
            self.stats.total += 1;
            let name = self.agent_name(template_path);

            if validate_only {
                match self.validate_template(template_path) {
                    Ok(result) => {
                        self.report_warnings(&result);
                        if result.valid {
                            console::success(&format!("  [OK] {name} (valid)"));
                            self.stats.success += 1;
                        } else {
                            console::error(&format!("  [X] {name} (invalid)"));
                            for error in &result.errors {
                                console::error(&format!("    -> {error}"));
                            }
                            self.stats.failed += 1;
                        }
                    }
                    Err(err) => {
                        console::error(&format!("  [X] {name}: {err}"));
                        self.stats.failed += 1;
                    }
                }
                continue;
            }

            match self.compile_template(template_path) {
                Ok(output_path) => {
                    if self.config.logging.verbose {
                        let shown = output_path
                            .strip_prefix(&self.root_dir)
                            .unwrap_or(&output_path);
                        console::success(&format!("  [OK] {name} -> {}", shown.display()));
                    } else {
                        console::success(&format!("  [OK] {name}"));
                    }
                    self.stats.success += 1;
                }
                Err(PipelineError::ValidationFailed(errors)) => {
                    console::error(&format!("  [X] Validation failed: {name}"));
                    for error in &errors {
                        console::error(&format!("    -> {error}"));
                    }
                    self.stats.failed += 1;
                }
                Err(err) => {
                    console::error(&format!("  [X] {name}: {err}"));
                    self.stats.failed += 1;
                }
            }
        }

        self.print_summary(validate_only);
        self.stats
    }

    fn render_template(&self, template_path: &Path) -> Result<String, PipelineError> {
        Ok(self.renderer.render(&self.template_rel(template_path))?)
    }

    fn validate_rendered(&self, rendered: &str) -> ValidationResult {
        #[cfg(feature = "test-hooks")]
        VALIDATION_CALL_COUNT.fetch_add(1, Ordering::SeqCst);

        self.validator.validate(rendered)
    }

    fn report_warnings(&mut self, result: &ValidationResult) {
        if !result.has_warnings() {
            return;
        }
        self.stats.warnings += result.warnings.len() as u32;
        if self.config.logging.show_warnings {
            for warning in &result.warnings {
                console::warning(&format!("    [WARN] {warning}"));
            }
        }
    }

    /// Template name relative to the renderer root, e.g. `agents/foo.md.j2`.
    fn template_rel(&self, template_path: &Path) -> String {
        let file_name = template_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match self.config.build.source_dir.file_name() {
            Some(dir) => format!("{}/{}", dir.to_string_lossy(), file_name),
            None => file_name,
        }
    }

    fn agent_name(&self, template_path: &Path) -> String {
        let file_name = template_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        file_name
            .strip_suffix(&self.config.templates.file_extension)
            .unwrap_or(&file_name)
            .to_string()
    }

    fn output_name(&self, template_path: &Path) -> String {
        format!(
            "{}{}",
            self.agent_name(template_path),
            self.config.templates.output_extension
        )
    }

    fn print_summary(&self, validate_only: bool) {
        console::info(&format!("\n{}", "=".repeat(50)));
        console::info("[STATS] Build Summary");
        console::info(&"=".repeat(50));
        console::info(&format!("  Total:   {}", self.stats.total));
        console::success(&format!("  Success: {}", self.stats.success));

        if self.stats.failed > 0 {
            console::error(&format!("  Failed:  {}", self.stats.failed));
        }

        if !validate_only {
            console::info(&format!(
                "\n  Output: {}/",
                self.config.build.output_dir.display()
            ));
        }
    }
}
