//! Template Rendering - minijinja Environment Wrapper

use chrono::Local;
use minijinja::{path_loader, Environment, ErrorKind};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Template error in {0}: {1}")]
    TemplateError(String, String),
}

/// Variables available to every template. Passed explicitly into the
/// renderer; there is no ambient build state.
#[derive(Debug, Clone, Serialize)]
pub struct BuildContext {
    pub build_timestamp: String,
    pub builder_version: String,
    /// Templates may branch on this to pull in shared skill content.
    pub include_skills: bool,
}

impl BuildContext {
    pub fn new() -> Self {
        Self {
            build_timestamp: Local::now().to_rfc3339(),
            builder_version: crate::BUILDER_VERSION.to_string(),
            include_skills: false,
        }
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Renderer {
    env: Environment<'static>,
    context: BuildContext,
}

impl Renderer {
    /// `template_root` is the directory template names are resolved
    /// against, including `{% include %}` paths.
    pub fn new(template_root: &Path, context: BuildContext) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(template_root));
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        Self { env, context }
    }

    pub fn render(&self, template_name: &str) -> Result<String, RenderError> {
        let template = self.env.get_template(template_name).map_err(|err| {
            if err.kind() == ErrorKind::TemplateNotFound {
                RenderError::TemplateNotFound(template_name.to_string())
            } else {
                RenderError::TemplateError(template_name.to_string(), err.to_string())
            }
        })?;

        template
            .render(&self.context)
            .map_err(|err| RenderError::TemplateError(template_name.to_string(), err.to_string()))
    }
}
