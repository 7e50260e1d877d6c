//! Certificate models

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Current version of the persisted `certificate_data` / `metadata` blobs.
pub const CERTIFICATE_SCHEMA_VERSION: u32 = 1;

/// Kind of achievement a certificate asserts
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CertificateType {
    CourseCompletion,
    ModuleCompletion,
}

impl CertificateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateType::CourseCompletion => "course_completion",
            CertificateType::ModuleCompletion => "module_completion",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CertificateType::CourseCompletion => "Course Completion",
            CertificateType::ModuleCompletion => "Module Completion",
        }
    }
}

impl fmt::Display for CertificateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "course_completion" => Ok(CertificateType::CourseCompletion),
            "module_completion" => Ok(CertificateType::ModuleCompletion),
            other => Err(format!("Invalid certificate type: {}", other)),
        }
    }
}

/// Lifecycle state of a certificate
///
/// `Pending` is only produced by external collaborators; generation always
/// creates `Issued` records and revocation is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Pending,
    Issued,
    Revoked,
}

impl CertificateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateStatus::Pending => "pending",
            CertificateStatus::Issued => "issued",
            CertificateStatus::Revoked => "revoked",
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificateStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(CertificateStatus::Pending),
            "issued" => Ok(CertificateStatus::Issued),
            "revoked" => Ok(CertificateStatus::Revoked),
            other => Err(format!("Invalid certificate status: {}", other)),
        }
    }
}

/// How a certificate came to exist
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    #[default]
    Bulk,
    Manual,
}

/// Snapshot of everything displayed on a certificate, frozen at issuance.
///
/// Later edits to the student or course never change what a certificate
/// shows; verification reads names from here first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CertificateData {
    pub schema_version: u32,
    pub student_name: String,
    pub course_title: String,
    pub duration_hours: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub completion_date: Option<NaiveDate>,
    pub issue_date: Option<NaiveDate>,
    pub instructor_names: Vec<String>,
    pub organization_name: String,
    pub verification_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
    /// Only present on records created before rendering moved to metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_html: Option<String>,
}

/// Generation provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct CertificateMetadata {
    pub schema_version: u32,
    pub generation_method: GenerationMethod,
    pub generated_by: Option<i64>,
    pub generated_at: Option<DateTime<Utc>>,
    pub template_id: Option<i64>,
    pub custom_fields: BTreeMap<String, Value>,
    /// Cached HTML
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered_html: Option<String>,
    /// Cached HTML under the key older records used. Kept apart from
    /// `rendered_html` because some rows carry both.
    #[serde(rename = "html_content", skip_serializing_if = "Option::is_none")]
    pub legacy_html_content: Option<String>,
}

/// An issued certificate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certificate {
    pub id: i64,
    pub certificate_number: String,
    pub certificate_type: CertificateType,
    pub user_id: i64,
    pub course_id: i64,
    pub status: CertificateStatus,
    pub issue_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub issued_by: Option<i64>,
    pub revoked_by: Option<i64>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoke_reason: Option<String>,
    pub certificate_data: CertificateData,
    pub metadata: CertificateMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Certificate {
    pub fn is_revoked(&self) -> bool {
        self.status == CertificateStatus::Revoked
    }

    /// Previously rendered HTML: metadata first, then metadata's legacy key,
    /// then the legacy `certificate_data` location. Blank entries are skipped.
    pub fn stored_html(&self) -> Option<&str> {
        [
            self.metadata.rendered_html.as_deref(),
            self.metadata.legacy_html_content.as_deref(),
            self.certificate_data.rendered_html.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find(|html| !html.trim().is_empty())
    }

    pub fn summary(&self) -> CertificateSummary {
        CertificateSummary {
            id: self.id,
            certificate_number: self.certificate_number.clone(),
            certificate_type: self.certificate_type,
            user_id: self.user_id,
            course_id: self.course_id,
            student_name: self.certificate_data.student_name.clone(),
            course_title: self.certificate_data.course_title.clone(),
            issue_date: self.issue_date,
        }
    }
}

/// Compact view returned from batch generation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CertificateSummary {
    pub id: i64,
    pub certificate_number: String,
    pub certificate_type: CertificateType,
    pub user_id: i64,
    pub course_id: i64,
    pub student_name: String,
    pub course_title: String,
    pub issue_date: NaiveDate,
}

/// Row to insert when issuing a certificate
#[derive(Debug, Clone)]
pub struct NewCertificate {
    pub certificate_number: String,
    pub certificate_type: CertificateType,
    pub user_id: i64,
    pub course_id: i64,
    pub issue_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub issued_by: i64,
    pub certificate_data: CertificateData,
    pub metadata: CertificateMetadata,
}

/// Aggregate counters for the admin dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CertificateStats {
    pub total: i64,
    pub issued: i64,
    pub pending: i64,
    pub revoked: i64,
    pub course_completion: i64,
    pub module_completion: i64,
    pub issued_this_month: i64,
    pub certified_students: i64,
}

/// Data merged into a template at render time
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenderContext {
    pub certificate_number: String,
    pub student_name: String,
    pub course_title: String,
    pub duration_hours: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub completion_date: NaiveDate,
    pub issue_date: NaiveDate,
    pub instructor_names: Vec<String>,
    pub organization_name: String,
    pub verification_url: String,
    pub module_name: Option<String>,
    pub custom_signature: Option<String>,
    pub custom_message: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,
}

impl RenderContext {
    /// Rebuild the context of an issued certificate from its snapshot
    pub fn from_certificate(certificate: &Certificate) -> Self {
        let data = &certificate.certificate_data;
        Self {
            certificate_number: certificate.certificate_number.clone(),
            student_name: data.student_name.clone(),
            course_title: data.course_title.clone(),
            duration_hours: data.duration_hours,
            start_date: data.start_date,
            completion_date: data.completion_date.unwrap_or(certificate.completion_date),
            issue_date: data.issue_date.unwrap_or(certificate.issue_date),
            instructor_names: data.instructor_names.clone(),
            organization_name: data.organization_name.clone(),
            verification_url: data.verification_url.clone(),
            module_name: data.module_name.clone(),
            custom_signature: data.custom_signature.clone(),
            custom_message: data.custom_message.clone(),
            custom_fields: certificate.metadata.custom_fields.clone(),
        }
    }

    /// Freeze this context into the persisted snapshot
    pub fn to_snapshot(&self) -> CertificateData {
        CertificateData {
            schema_version: CERTIFICATE_SCHEMA_VERSION,
            student_name: self.student_name.clone(),
            course_title: self.course_title.clone(),
            duration_hours: self.duration_hours,
            start_date: self.start_date,
            completion_date: Some(self.completion_date),
            issue_date: Some(self.issue_date),
            instructor_names: self.instructor_names.clone(),
            organization_name: self.organization_name.clone(),
            verification_url: self.verification_url.clone(),
            module_name: self.module_name.clone(),
            custom_signature: self.custom_signature.clone(),
            custom_message: self.custom_message.clone(),
            rendered_html: None,
        }
    }

    /// Template data, exposed under both the snake_case field names and the
    /// upper-case names used by the default certificate template.
    /// Built-in names win over custom fields with the same key.
    pub fn to_template_data(&self) -> Value {
        let duration = self
            .duration_hours
            .map(|h| h.normalize().to_string())
            .unwrap_or_default();
        let start_date = self.start_date.map(|d| d.to_string()).unwrap_or_default();
        let instructors = self.instructor_names.join(", ");

        let fields: [(&str, &str, Value); 13] = [
            ("certificate_number", "CERTIFICATE_NUMBER", self.certificate_number.clone().into()),
            ("student_name", "STUDENT_NAME", self.student_name.clone().into()),
            ("course_title", "COURSE_NAME", self.course_title.clone().into()),
            ("duration_hours", "DURATION_HOURS", duration.into()),
            ("start_date", "START_DATE", start_date.into()),
            ("completion_date", "COMPLETION_DATE", self.completion_date.to_string().into()),
            ("issue_date", "ISSUE_DATE", self.issue_date.to_string().into()),
            ("instructor_name", "INSTRUCTOR_NAME", instructors.into()),
            ("organization_name", "ORGANIZATION_NAME", self.organization_name.clone().into()),
            ("verification_url", "VERIFICATION_URL", self.verification_url.clone().into()),
            ("module_name", "MODULE_NAME", optional(&self.module_name)),
            ("custom_signature", "CUSTOM_SIGNATURE", optional(&self.custom_signature)),
            ("custom_message", "CUSTOM_MESSAGE", optional(&self.custom_message)),
        ];

        let mut data = Map::new();
        for (lower, upper, value) in fields {
            data.insert(lower.to_string(), value.clone());
            data.insert(upper.to_string(), value);
        }
        data.insert(
            "instructor_names".to_string(),
            Value::from(self.instructor_names.clone()),
        );
        for (key, value) in &self.custom_fields {
            data.entry(key.clone()).or_insert_with(|| value.clone());
        }
        Value::Object(data)
    }

    /// Placeholder data for template previews
    pub fn sample() -> Self {
        let today = Utc::now().date_naive();
        Self {
            certificate_number: "BIT2025SAMPLE01".to_string(),
            student_name: "Jane Doe".to_string(),
            course_title: "Introduction to Data Science".to_string(),
            duration_hours: Some(Decimal::new(40, 0)),
            start_date: today.checked_sub_days(chrono::Days::new(60)),
            completion_date: today,
            issue_date: today,
            instructor_names: vec!["Dr. John Smith".to_string()],
            organization_name: "Sample Academy".to_string(),
            verification_url: "https://example.com/verify/BIT2025SAMPLE01".to_string(),
            module_name: None,
            custom_signature: Some("Director of Studies".to_string()),
            custom_message: Some("With distinction".to_string()),
            custom_fields: BTreeMap::new(),
        }
    }
}

fn optional(value: &Option<String>) -> Value {
    value.clone().map(Value::String).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn certificate_with(metadata: CertificateMetadata, legacy: Option<&str>) -> Certificate {
        let now = Utc::now();
        Certificate {
            id: 1,
            certificate_number: "BIT2023LEGACY01".to_string(),
            certificate_type: CertificateType::CourseCompletion,
            user_id: 501,
            course_id: 9,
            status: CertificateStatus::Issued,
            issue_date: now.date_naive(),
            completion_date: now.date_naive(),
            issued_by: None,
            revoked_by: None,
            revoked_at: None,
            revoke_reason: None,
            certificate_data: CertificateData {
                rendered_html: legacy.map(str::to_string),
                ..Default::default()
            },
            metadata,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn legacy_metadata_html_field_is_accepted() {
        let metadata: CertificateMetadata =
            serde_json::from_value(serde_json::json!({ "html_content": "<p>old</p>" })).unwrap();
        assert_eq!(metadata.legacy_html_content.as_deref(), Some("<p>old</p>"));
        assert_eq!(metadata.schema_version, 0);
        assert_eq!(
            certificate_with(metadata.clone(), None).stored_html(),
            Some("<p>old</p>")
        );

        let written = serde_json::to_value(&metadata).unwrap();
        assert_eq!(written["html_content"], "<p>old</p>");
    }

    #[test]
    fn metadata_with_both_html_keys_prefers_current() {
        let metadata: CertificateMetadata = serde_json::from_value(serde_json::json!({
            "rendered_html": "<p>new</p>",
            "html_content": "<p>old</p>"
        }))
        .unwrap();
        assert_eq!(
            certificate_with(metadata, Some("<p>oldest</p>")).stored_html(),
            Some("<p>new</p>")
        );
    }

    #[test]
    fn blank_stored_html_falls_through() {
        let metadata = CertificateMetadata {
            rendered_html: Some("  ".to_string()),
            legacy_html_content: Some(String::new()),
            ..Default::default()
        };
        let certificate = certificate_with(metadata, Some("<p>snapshot</p>"));
        assert_eq!(certificate.stored_html(), Some("<p>snapshot</p>"));

        let nothing = certificate_with(CertificateMetadata::default(), Some(" "));
        assert_eq!(nothing.stored_html(), None);
    }

    #[test]
    fn template_data_exposes_both_naming_styles() {
        let ctx = RenderContext::sample();
        let data = ctx.to_template_data();
        assert_eq!(data["STUDENT_NAME"], "Jane Doe");
        assert_eq!(data["student_name"], "Jane Doe");
        assert_eq!(data["COURSE_NAME"], "Introduction to Data Science");
        assert_eq!(data["DURATION_HOURS"], "40");
        assert_eq!(data["MODULE_NAME"], Value::Null);
    }

    #[test]
    fn custom_fields_do_not_shadow_builtins() {
        let mut ctx = RenderContext::sample();
        ctx.custom_fields
            .insert("STUDENT_NAME".to_string(), Value::from("Mallory"));
        ctx.custom_fields.insert("grade".to_string(), Value::from("A"));
        let data = ctx.to_template_data();
        assert_eq!(data["STUDENT_NAME"], "Jane Doe");
        assert_eq!(data["grade"], "A");
    }

    #[test]
    fn certificate_type_round_trips_through_str() {
        for t in [CertificateType::CourseCompletion, CertificateType::ModuleCompletion] {
            assert_eq!(t.as_str().parse::<CertificateType>().unwrap(), t);
        }
        assert!("diploma".parse::<CertificateType>().is_err());
    }
}
