//! Certificate template models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Administrator-authored HTML skeleton for certificates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificateTemplate {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub html_content: String,
    pub css_styles: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a template
#[derive(Debug, Clone)]
pub struct NewCertificateTemplate {
    pub name: String,
    pub description: Option<String>,
    pub html_content: String,
    pub css_styles: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_by: i64,
}

/// Partial update of a template; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct TemplateChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub html_content: Option<String>,
    pub css_styles: Option<String>,
    pub is_active: Option<bool>,
}

/// Built-in template used to seed empty installations
pub const DEFAULT_TEMPLATE_HTML: &str = r#"<div class="certificate">
  <div class="certificate-border">
    <p class="organization">{{ORGANIZATION_NAME}}</p>
    <h1 class="title">Certificate of Completion</h1>
    <p class="subtitle">This certifies that</p>
    <h2 class="student">{{STUDENT_NAME}}</h2>
    <p class="subtitle">has successfully completed</p>
    <h3 class="course">{{COURSE_NAME}}{{#if MODULE_NAME}} &mdash; {{MODULE_NAME}}{{/if}}</h3>
    {{#if DURATION_HOURS}}<p class="duration">{{formatNumber DURATION_HOURS}} hours</p>{{/if}}
    {{#if CUSTOM_MESSAGE}}<p class="message">{{CUSTOM_MESSAGE}}</p>{{/if}}
    <div class="footer">
      <div class="signature">
        <p class="signature-line">{{INSTRUCTOR_NAME}}</p>
        <p class="signature-caption">{{#if CUSTOM_SIGNATURE}}{{CUSTOM_SIGNATURE}}{{else}}Instructor{{/if}}</p>
      </div>
      <div class="details">
        <p>Completed {{formatDate COMPLETION_DATE}}</p>
        <p>Certificate No. {{CERTIFICATE_NUMBER}}</p>
        <p class="verify">{{VERIFICATION_URL}}</p>
      </div>
    </div>
  </div>
</div>"#;

pub const DEFAULT_TEMPLATE_CSS: &str = r#".certificate { width: 100%; height: 100%; padding: 12mm; background: #fdfbf5; font-family: Georgia, serif; color: #1a365d; }
.certificate-border { height: 100%; border: 3mm double #b7892b; padding: 14mm; text-align: center; }
.organization { font-size: 14pt; letter-spacing: 2px; text-transform: uppercase; }
.title { font-size: 34pt; margin: 8mm 0 4mm; }
.subtitle { font-size: 13pt; color: #4a5568; }
.student { font-size: 28pt; margin: 4mm 0; border-bottom: 1px solid #b7892b; display: inline-block; padding: 0 10mm; }
.course { font-size: 18pt; margin: 4mm 0; }
.footer { display: flex; justify-content: space-between; margin-top: 14mm; font-size: 10pt; }
.signature-line { border-top: 1px solid #1a365d; padding-top: 2mm; min-width: 60mm; }
.details { text-align: right; }"#;
