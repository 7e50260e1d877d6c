//! Template catalog management and editor support

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    CertificateTemplate, NewCertificateTemplate, RenderContext, TemplateChanges, TemplateEngine,
    TemplateError, DEFAULT_TEMPLATE_CSS, DEFAULT_TEMPLATE_HTML,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::pdf::{PdfRenderer, ScreenshotOptions};
use crate::store::CertificateStore;

/// Input for creating a template
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTemplateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub html_content: String,
    pub css_styles: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Input for updating a template; absent fields are kept
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateTemplateInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub html_content: Option<String>,
    pub css_styles: Option<String>,
    pub is_active: Option<bool>,
}

/// Template source to check in the editor
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeTemplateInput {
    pub html_content: String,
}

/// Compile result plus the variables the template references
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateAnalysis {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub variables: Vec<String>,
}

/// Request for a rendered preview
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewTemplateInput {
    pub html_content: String,
    pub css_styles: Option<String>,
    /// Values laid over the sample certificate data
    pub data: Option<Value>,
    /// Also capture a PNG through the browser
    #[serde(default)]
    pub screenshot: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplatePreview {
    /// Complete, print-ready document
    pub html: String,
    /// `data:image/png;base64,...` when a screenshot was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub variables: Vec<String>,
}

/// Template service
#[derive(Clone)]
pub struct TemplateService {
    store: Arc<dyn CertificateStore>,
    engine: Arc<TemplateEngine>,
    renderer: Arc<PdfRenderer>,
}

impl TemplateService {
    pub fn new(
        store: Arc<dyn CertificateStore>,
        engine: Arc<TemplateEngine>,
        renderer: Arc<PdfRenderer>,
    ) -> Self {
        Self {
            store,
            engine,
            renderer,
        }
    }

    pub async fn list_templates(&self, active_only: bool) -> AppResult<Vec<CertificateTemplate>> {
        self.store.list_templates(active_only).await
    }

    pub async fn get_template(&self, template_id: i64) -> AppResult<CertificateTemplate> {
        self.store
            .find_template(template_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Certificate template".to_string()))
    }

    /// Create a template. The first template of an installation becomes the
    /// default even when not asked to.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_template(
        &self,
        input: CreateTemplateInput,
        created_by: i64,
    ) -> AppResult<CertificateTemplate> {
        input.validate()?;
        check_name(&input.name)?;
        self.ensure_compiles(&input.html_content)?;

        let is_default = input.is_default || self.store.find_default_template().await?.is_none();
        let template = self
            .store
            .insert_template(NewCertificateTemplate {
                name: input.name.trim().to_string(),
                description: input.description,
                html_content: input.html_content,
                css_styles: input.css_styles,
                is_active: true,
                is_default,
                created_by,
            })
            .await?;

        info!(template_id = template.id, is_default, "Certificate template created");
        Ok(template)
    }

    #[instrument(skip(self, input))]
    pub async fn update_template(
        &self,
        template_id: i64,
        input: UpdateTemplateInput,
    ) -> AppResult<CertificateTemplate> {
        input.validate()?;
        if let Some(name) = &input.name {
            check_name(name)?;
        }
        if let Some(html) = &input.html_content {
            self.ensure_compiles(html)?;
        }

        let existing = self.get_template(template_id).await?;
        if existing.is_default && input.is_active == Some(false) {
            return Err(AppError::InvalidStateTransition(
                "The default template cannot be deactivated".to_string(),
            ));
        }

        let changes = TemplateChanges {
            name: input.name.map(|n| n.trim().to_string()),
            description: input.description,
            html_content: input.html_content,
            css_styles: input.css_styles,
            is_active: input.is_active,
        };
        self.store
            .update_template(template_id, changes)
            .await?
            .ok_or_else(|| AppError::NotFound("Certificate template".to_string()))
    }

    /// Make an active template the single default
    #[instrument(skip(self))]
    pub async fn set_default_template(&self, template_id: i64) -> AppResult<CertificateTemplate> {
        let template = self.get_template(template_id).await?;
        if !template.is_active {
            return Err(AppError::InvalidStateTransition(
                "Only an active template can be the default".to_string(),
            ));
        }
        let template = self
            .store
            .set_default_template(template_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Certificate template".to_string()))?;
        info!(template_id, "Default certificate template changed");
        Ok(template)
    }

    /// Install the built-in template when the catalog is empty
    pub async fn ensure_default_template(&self, created_by: i64) -> AppResult<()> {
        if !self.store.list_templates(false).await?.is_empty() {
            return Ok(());
        }
        self.store
            .insert_template(NewCertificateTemplate {
                name: "Classic".to_string(),
                description: Some("Built-in certificate of completion".to_string()),
                html_content: DEFAULT_TEMPLATE_HTML.to_string(),
                css_styles: Some(DEFAULT_TEMPLATE_CSS.to_string()),
                is_active: true,
                is_default: true,
                created_by,
            })
            .await?;
        info!("Installed built-in certificate template");
        Ok(())
    }

    pub fn analyze(&self, html_content: &str) -> TemplateAnalysis {
        let validation = self.engine.validate(html_content);
        TemplateAnalysis {
            valid: validation.valid,
            error: validation.error,
            variables: self.engine.extract_variables(html_content),
        }
    }

    /// Render a template against sample data, optionally with a screenshot
    #[instrument(skip(self, input), fields(screenshot = input.screenshot))]
    pub async fn preview(&self, input: PreviewTemplateInput) -> AppResult<TemplatePreview> {
        self.ensure_compiles(&input.html_content)?;

        let mut data = RenderContext::sample().to_template_data();
        if let (Value::Object(base), Some(Value::Object(overrides))) = (&mut data, input.data) {
            base.extend(overrides);
        }

        let fragment = self.engine.render(&input.html_content, &data)?;
        let html = self
            .engine
            .create_complete_html(&fragment, input.css_styles.as_deref());

        let image = if input.screenshot {
            let png = self
                .renderer
                .generate_screenshot(&html, &ScreenshotOptions::default())
                .await?;
            Some(format!("data:image/png;base64,{}", STANDARD.encode(png)))
        } else {
            None
        };

        Ok(TemplatePreview {
            html,
            image,
            variables: self.engine.extract_variables(&input.html_content),
        })
    }

    fn ensure_compiles(&self, html: &str) -> AppResult<()> {
        let validation = self.engine.validate(html);
        if validation.valid {
            Ok(())
        } else {
            Err(TemplateError::Syntax(validation.error.unwrap_or_default()).into())
        }
    }
}

fn check_name(name: &str) -> AppResult<()> {
    shared::validate_template_name(name).map_err(|message| AppError::Validation {
        field: "name".to_string(),
        message: message.to_string(),
        message_th: "ชื่อแม่แบบไม่ถูกต้อง".to_string(),
    })
}
