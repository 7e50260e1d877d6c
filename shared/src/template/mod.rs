//! Certificate template engine
//!
//! Templates use the mustache-style `{{variable}}` syntax with block helpers
//! (`{{#if X}}...{{/if}}`) and the fixed helper set in [`helpers`]. Rendering
//! is lenient about data: a variable missing from the context renders as an
//! empty string, so partially filled previews stay usable. Malformed syntax is
//! always an error.
//!
//! ```ignore
//! let engine = TemplateEngine::new(Language::English);
//! let html = engine.render("<p>{{STUDENT_NAME}}</p>", &json!({ "STUDENT_NAME": "Ada" }))?;
//! ```

mod document;
pub mod helpers;
mod scan;

use handlebars::{Handlebars, Template};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{Language, PageGeometry};

pub use document::{create_complete_html, is_complete_document};
pub use scan::extract_variables;

/// Template errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TemplateError {
    /// The template does not compile (unbalanced blocks, bad tags).
    #[error("Template syntax error: {0}")]
    Syntax(String),

    /// A helper was invoked incorrectly while rendering.
    #[error("Template render error: {0}")]
    Render(String),
}

/// Outcome of a compile-only check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compiles and renders certificate templates
pub struct TemplateEngine {
    registry: Handlebars<'static>,
    language: Language,
    page: PageGeometry,
}

impl TemplateEngine {
    /// Create an engine formatting dates for `language`, wrapping documents
    /// for A4 landscape pages.
    pub fn new(language: Language) -> Self {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(false);
        helpers::register_helpers(&mut registry, language);
        Self {
            registry,
            language,
            page: PageGeometry::certificate(),
        }
    }

    /// Use a different page geometry for [`Self::create_complete_html`]
    pub fn with_page(mut self, page: PageGeometry) -> Self {
        self.page = page;
        self
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn page(&self) -> PageGeometry {
        self.page
    }

    /// Compile `template` and apply `data`
    pub fn render(&self, template: &str, data: &Value) -> Result<String, TemplateError> {
        compile(template)?;
        self.registry
            .render_template(template, data)
            .map_err(|e| TemplateError::Render(e.to_string()))
    }

    /// Compile-only check for the template editor. Never fails.
    pub fn validate(&self, template: &str) -> TemplateValidation {
        match compile(template) {
            Ok(()) => TemplateValidation {
                valid: true,
                error: None,
            },
            Err(e) => TemplateValidation {
                valid: false,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn extract_variables(&self, template: &str) -> Vec<String> {
        extract_variables(template)
    }

    /// Wrap a fragment in a print-ready document for this engine's page
    pub fn create_complete_html(&self, fragment: &str, css: Option<&str>) -> String {
        create_complete_html(fragment, css, self.page, self.language)
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

fn compile(template: &str) -> Result<(), TemplateError> {
    Template::compile(template)
        .map(|_| ())
        .map_err(|e| TemplateError::Syntax(e.to_string()))
}
