//! Certificate lifecycle: issuance, PDF output, revocation and verification

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::template::is_complete_document;
use shared::{
    Certificate, CertificateMetadata, CertificateStats, CertificateStatus, CertificateSummary,
    CertificateTemplate, CertificateType, CourseRecord, GenerationMethod, NewCertificate,
    Pagination, RenderContext, StudentRecord, TemplateEngine, TemplateError, CERTIFICATE_SCHEMA_VERSION,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::config::CertificateConfig;
use crate::error::{AppError, AppResult};
use crate::pdf::{PdfOptions, PdfRenderer};
use crate::store::{CertificateFilter, CertificateStore, DUPLICATE_CERTIFICATE, DUPLICATE_NUMBER};

/// Per-student error for a live certificate on the same course and type
pub const ALREADY_ISSUED: &str = "Student already has a certificate for this course";

/// Per-student error for an unknown student id
pub const STUDENT_NOT_FOUND: &str = "Student not found";

/// Per-student error when the batch names an unknown course
pub const COURSE_NOT_FOUND: &str = "Course not found";

/// Inserts attempted with fresh numbers before giving up on a student
const NUMBER_ATTEMPTS: usize = 3;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

// ============================================================================
// Certificate numbers
// ============================================================================

/// Source of new certificate numbers
pub trait NumberSource: Send + Sync {
    fn next_number(&self) -> String;
}

/// `<PREFIX><YEAR><8 base36 chars>`, e.g. `BIT2025AB12CD34`
#[derive(Debug, Clone)]
pub struct CertificateNumberGenerator {
    prefix: String,
}

impl CertificateNumberGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn generate_for_year(&self, year: i32) -> String {
        // The low 64 bits of a v4 UUID hold 62 random bits; 8 base36 digits need 42.
        let mut bits = Uuid::new_v4().as_u128() as u64;
        let mut number = format!("{}{:04}", self.prefix, year);
        for _ in 0..shared::CERTIFICATE_SUFFIX_LEN {
            number.push(BASE36[(bits % 36) as usize] as char);
            bits /= 36;
        }
        number
    }
}

impl NumberSource for CertificateNumberGenerator {
    fn next_number(&self) -> String {
        self.generate_for_year(Utc::now().year())
    }
}

// ============================================================================
// Inputs and results
// ============================================================================

/// Request to issue certificates for a batch of students
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateCertificatesInput {
    pub course_id: i64,

    #[validate(length(min = 1, message = "At least one student is required"))]
    pub student_ids: Vec<i64>,

    /// Defaults to course completion
    pub certificate_type: Option<CertificateType>,

    /// Overrides the course duration
    pub manual_hours: Option<Decimal>,

    /// Overrides the course start date
    pub manual_start_date: Option<NaiveDate>,

    /// Defaults to today
    pub manual_completion_date: Option<NaiveDate>,

    /// Defaults to today
    pub manual_issue_date: Option<NaiveDate>,

    #[validate(length(max = 255))]
    pub custom_signature: Option<String>,

    #[validate(length(max = 2000))]
    pub custom_message: Option<String>,

    /// Required for module certificates
    #[validate(length(max = 255))]
    pub module_name: Option<String>,

    /// Defaults to the current default template
    pub template_id: Option<i64>,

    #[serde(default)]
    pub custom_fields: BTreeMap<String, Value>,

    #[serde(default)]
    pub generation_method: GenerationMethod,
}

impl GenerateCertificatesInput {
    pub fn new(course_id: i64, student_ids: Vec<i64>) -> Self {
        Self {
            course_id,
            student_ids,
            certificate_type: None,
            manual_hours: None,
            manual_start_date: None,
            manual_completion_date: None,
            manual_issue_date: None,
            custom_signature: None,
            custom_message: None,
            module_name: None,
            template_id: None,
            custom_fields: BTreeMap::new(),
            generation_method: GenerationMethod::default(),
        }
    }
}

/// A student the batch skipped, with the reason
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationError {
    pub student_id: i64,
    pub error: String,
}

/// Outcome of a batch; both lists must be checked
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationResult {
    pub generated_count: usize,
    pub certificates: Vec<CertificateSummary>,
    pub errors: Vec<GenerationError>,
}

/// Public view of a certificate returned by verification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifiedCertificate {
    pub certificate_number: String,
    pub certificate_type: CertificateType,
    pub status: CertificateStatus,
    pub issue_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub organization_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoke_reason: Option<String>,
}

impl From<&Certificate> for VerifiedCertificate {
    fn from(certificate: &Certificate) -> Self {
        Self {
            certificate_number: certificate.certificate_number.clone(),
            certificate_type: certificate.certificate_type,
            status: certificate.status,
            issue_date: certificate.issue_date,
            completion_date: certificate.completion_date,
            organization_name: certificate.certificate_data.organization_name.clone(),
            module_name: certificate.certificate_data.module_name.clone(),
            revoked_at: certificate.revoked_at,
            revoke_reason: certificate.revoke_reason.clone(),
        }
    }
}

/// Answer to "is this certificate number genuine?"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerificationResult {
    pub valid: bool,
    pub certificate: Option<VerifiedCertificate>,
    pub student_name: Option<String>,
    pub course_title: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub message: String,
}

impl VerificationResult {
    fn rejected(message: &str) -> Self {
        Self {
            valid: false,
            certificate: None,
            student_name: None,
            course_title: None,
            issue_date: None,
            message: message.to_string(),
        }
    }
}

/// One line of the CSV export
#[derive(Debug, Serialize)]
pub struct CertificateExportRow {
    pub certificate_number: String,
    pub certificate_type: CertificateType,
    pub status: CertificateStatus,
    pub user_id: i64,
    pub student_name: String,
    pub course_id: i64,
    pub course_title: String,
    pub module_name: Option<String>,
    pub issue_date: NaiveDate,
    pub completion_date: NaiveDate,
    pub revoked_at: Option<DateTime<Utc>>,
    pub revoke_reason: Option<String>,
}

impl From<&Certificate> for CertificateExportRow {
    fn from(c: &Certificate) -> Self {
        Self {
            certificate_number: c.certificate_number.clone(),
            certificate_type: c.certificate_type,
            status: c.status,
            user_id: c.user_id,
            student_name: c.certificate_data.student_name.clone(),
            course_id: c.course_id,
            course_title: c.certificate_data.course_title.clone(),
            module_name: c.certificate_data.module_name.clone(),
            issue_date: c.issue_date,
            completion_date: c.completion_date,
            revoked_at: c.revoked_at,
            revoke_reason: c.revoke_reason.clone(),
        }
    }
}

// ============================================================================
// Service
// ============================================================================

/// Certificate service
#[derive(Clone)]
pub struct CertificateService {
    store: Arc<dyn CertificateStore>,
    engine: Arc<TemplateEngine>,
    renderer: Arc<PdfRenderer>,
    numbers: Arc<dyn NumberSource>,
    config: Arc<CertificateConfig>,
}

/// Values shared by every student of one batch
struct Batch<'a> {
    input: &'a GenerateCertificatesInput,
    certificate_type: CertificateType,
    module_name: Option<String>,
    course: Option<&'a CourseRecord>,
    template: &'a CertificateTemplate,
    issued_by: i64,
    today: NaiveDate,
}

impl CertificateService {
    pub fn new(
        store: Arc<dyn CertificateStore>,
        engine: Arc<TemplateEngine>,
        renderer: Arc<PdfRenderer>,
        config: CertificateConfig,
    ) -> Self {
        let numbers = Arc::new(CertificateNumberGenerator::new(config.number_prefix.clone()));
        Self {
            store,
            engine,
            renderer,
            numbers,
            config: Arc::new(config),
        }
    }

    /// Replace the number generator
    pub fn with_number_source(mut self, numbers: Arc<dyn NumberSource>) -> Self {
        self.numbers = numbers;
        self
    }

    // ========================================================================
    // Issuance
    // ========================================================================

    /// Issue certificates for every student in the batch.
    ///
    /// Problems with the batch as a whole (template, module name) fail the
    /// call. Problems with one student, a missing course included, are
    /// recorded in [`GenerationResult::errors`] and the batch continues.
    #[instrument(
        skip(self, input),
        fields(course_id = input.course_id, students = input.student_ids.len())
    )]
    pub async fn generate_certificates(
        &self,
        input: GenerateCertificatesInput,
        issued_by: i64,
    ) -> AppResult<GenerationResult> {
        input.validate()?;

        let certificate_type = input
            .certificate_type
            .unwrap_or(CertificateType::CourseCompletion);
        let module_name = input
            .module_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        if certificate_type == CertificateType::ModuleCompletion && module_name.is_none() {
            return Err(AppError::Validation {
                field: "module_name".to_string(),
                message: "Module name is required for module certificates".to_string(),
                message_th: "ต้องระบุชื่อโมดูลสำหรับใบประกาศนียบัตรระดับโมดูล".to_string(),
            });
        }

        let template = self.resolve_template(input.template_id).await?;
        let validation = self.engine.validate(&template.html_content);
        if !validation.valid {
            return Err(TemplateError::Syntax(validation.error.unwrap_or_default()).into());
        }

        let course = self.store.find_course(input.course_id).await?;
        if course.is_none() {
            warn!("Course not found; every student will be reported");
        }

        let batch = Batch {
            input: &input,
            certificate_type,
            module_name,
            course: course.as_ref(),
            template: &template,
            issued_by,
            today: Utc::now().date_naive(),
        };

        let mut result = GenerationResult::default();
        for &student_id in &input.student_ids {
            match self.issue_one(&batch, student_id).await {
                Ok(certificate) => {
                    info!(
                        student_id,
                        certificate_number = %certificate.certificate_number,
                        "Certificate issued"
                    );
                    result.certificates.push(certificate.summary());
                }
                Err(err) => {
                    let error = student_error_message(&err);
                    warn!(student_id, %error, "Certificate not issued");
                    result.errors.push(GenerationError { student_id, error });
                }
            }
        }
        result.generated_count = result.certificates.len();

        info!(
            generated = result.generated_count,
            failed = result.errors.len(),
            template_id = template.id,
            "Certificate batch finished"
        );
        Ok(result)
    }

    async fn issue_one(&self, batch: &Batch<'_>, student_id: i64) -> AppResult<Certificate> {
        // Checked per student so overlapping batches stay safe; the store's
        // unique index catches whatever slips between check and insert.
        if self
            .store
            .find_active_certificate(student_id, batch.input.course_id, batch.certificate_type)
            .await?
            .is_some()
        {
            return Err(AppError::DuplicateEntry(DUPLICATE_CERTIFICATE.to_string()));
        }

        let course = batch
            .course
            .ok_or_else(|| AppError::NotFound("Course".to_string()))?;

        let student = self
            .store
            .find_student(student_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Student".to_string()))?;

        for attempt in 1..=NUMBER_ATTEMPTS {
            let number = self.numbers.next_number();
            let context = self.render_context(batch, course, &student, number);
            let html = self
                .engine
                .render(&batch.template.html_content, &context.to_template_data())?;

            let certificate = NewCertificate {
                certificate_number: context.certificate_number.clone(),
                certificate_type: batch.certificate_type,
                user_id: student.id,
                course_id: course.id,
                issue_date: context.issue_date,
                completion_date: context.completion_date,
                issued_by: batch.issued_by,
                certificate_data: context.to_snapshot(),
                metadata: CertificateMetadata {
                    schema_version: CERTIFICATE_SCHEMA_VERSION,
                    generation_method: batch.input.generation_method,
                    generated_by: Some(batch.issued_by),
                    generated_at: Some(Utc::now()),
                    template_id: Some(batch.template.id),
                    custom_fields: batch.input.custom_fields.clone(),
                    rendered_html: self.config.cache_rendered_html.then_some(html),
                    legacy_html_content: None,
                },
            };

            match self.store.insert_certificate(certificate).await {
                Err(AppError::DuplicateEntry(field)) if field == DUPLICATE_NUMBER => {
                    warn!(student_id, attempt, "Certificate number collision, retrying");
                }
                other => return other,
            }
        }

        Err(AppError::Internal(
            "Could not allocate a unique certificate number".to_string(),
        ))
    }

    fn render_context(
        &self,
        batch: &Batch<'_>,
        course: &CourseRecord,
        student: &StudentRecord,
        certificate_number: String,
    ) -> RenderContext {
        let input = batch.input;
        RenderContext {
            verification_url: self.verification_url(&certificate_number),
            certificate_number,
            student_name: student.full_name.clone(),
            course_title: course.title.clone(),
            duration_hours: input.manual_hours.or(course.duration_hours),
            start_date: input.manual_start_date.or(course.start_date),
            completion_date: input.manual_completion_date.unwrap_or(batch.today),
            issue_date: input.manual_issue_date.unwrap_or(batch.today),
            instructor_names: course.instructor_names.clone(),
            organization_name: self.config.organization_name.clone(),
            module_name: batch.module_name.clone(),
            custom_signature: input.custom_signature.clone(),
            custom_message: input.custom_message.clone(),
            custom_fields: input.custom_fields.clone(),
        }
    }

    fn verification_url(&self, certificate_number: &str) -> String {
        format!(
            "{}/{}",
            self.config.verification_base_url.trim_end_matches('/'),
            certificate_number
        )
    }

    async fn resolve_template(&self, template_id: Option<i64>) -> AppResult<CertificateTemplate> {
        let template = match template_id {
            Some(id) => self.store.find_template(id).await?,
            None => self.store.find_default_template().await?,
        }
        .ok_or_else(|| AppError::NotFound("Certificate template".to_string()))?;

        if !template.is_active {
            return Err(AppError::Validation {
                field: "template_id".to_string(),
                message: format!("Certificate template '{}' is inactive", template.name),
                message_th: "แม่แบบใบประกาศนียบัตรนี้ถูกปิดใช้งาน".to_string(),
            });
        }
        Ok(template)
    }

    // ========================================================================
    // PDF
    // ========================================================================

    /// Render the certificate to an A4 landscape PDF
    #[instrument(skip(self))]
    pub async fn generate_pdf(&self, certificate_id: i64) -> AppResult<Vec<u8>> {
        let certificate = self.get_certificate(certificate_id).await?;
        let (html, css) = self.certificate_html(&certificate).await?;

        let document = if is_complete_document(&html) {
            html
        } else {
            self.engine.create_complete_html(&html, css.as_deref())
        };

        let pdf = self
            .renderer
            .generate_pdf(&document, &PdfOptions::certificate())
            .await?;
        info!(
            certificate_number = %certificate.certificate_number,
            bytes = pdf.len(),
            "Certificate PDF generated"
        );
        Ok(pdf)
    }

    /// HTML and template CSS for a stored certificate. Cached HTML wins;
    /// otherwise the snapshot is rendered through the template it was issued
    /// with, or the current default. The template is only loaded when a
    /// fragment needs its CSS or the snapshot needs rendering.
    async fn certificate_html(
        &self,
        certificate: &Certificate,
    ) -> AppResult<(String, Option<String>)> {
        if let Some(html) = certificate.stored_html() {
            debug!("Using stored certificate HTML");
            if is_complete_document(html) {
                return Ok((html.to_string(), None));
            }
            let css = self
                .issuing_template(certificate)
                .await?
                .and_then(|t| t.css_styles);
            return Ok((html.to_string(), css));
        }

        let data = &certificate.certificate_data;
        let has_snapshot = !data.student_name.trim().is_empty() || !data.course_title.trim().is_empty();
        if !has_snapshot {
            return Err(AppError::MissingContent(
                certificate.certificate_number.clone(),
            ));
        }

        match self.issuing_template(certificate).await? {
            Some(template) => {
                let context = RenderContext::from_certificate(certificate);
                let html = self
                    .engine
                    .render(&template.html_content, &context.to_template_data())?;
                Ok((html, template.css_styles))
            }
            None => Err(AppError::MissingContent(
                certificate.certificate_number.clone(),
            )),
        }
    }

    async fn issuing_template(
        &self,
        certificate: &Certificate,
    ) -> AppResult<Option<CertificateTemplate>> {
        if let Some(id) = certificate.metadata.template_id {
            if let Some(template) = self.store.find_template(id).await? {
                return Ok(Some(template));
            }
        }
        self.store.find_default_template().await
    }

    // ========================================================================
    // Revocation and verification
    // ========================================================================

    /// Revoke a certificate. Revoking an already revoked certificate keeps the
    /// original audit stamp and succeeds, unless strict revocation is on.
    #[instrument(skip(self, reason))]
    pub async fn revoke_certificate(
        &self,
        certificate_id: i64,
        revoked_by: i64,
        reason: &str,
    ) -> AppResult<Certificate> {
        shared::validate_revoke_reason(reason).map_err(|message| AppError::Validation {
            field: "reason".to_string(),
            message: message.to_string(),
            message_th: "ต้องระบุเหตุผลในการเพิกถอน".to_string(),
        })?;

        if let Some(revoked) = self
            .store
            .revoke_certificate(certificate_id, revoked_by, reason.trim(), Utc::now())
            .await?
        {
            info!(
                certificate_number = %revoked.certificate_number,
                revoked_by,
                "Certificate revoked"
            );
            return Ok(revoked);
        }

        let existing = self.get_certificate(certificate_id).await?;
        if self.config.strict_revocation {
            return Err(AppError::InvalidStateTransition(format!(
                "Certificate {} is already revoked",
                existing.certificate_number
            )));
        }
        debug!(
            certificate_number = %existing.certificate_number,
            "Certificate already revoked"
        );
        Ok(existing)
    }

    /// Look up a certificate by number. Never fails: unknown numbers and
    /// storage problems produce an invalid result with a message.
    #[instrument(skip(self))]
    pub async fn verify_certificate(&self, certificate_number: &str) -> VerificationResult {
        let number = certificate_number.trim().to_ascii_uppercase();
        let certificate = match self.store.find_certificate_by_number(&number).await {
            Ok(Some(certificate)) => certificate,
            Ok(None) => return VerificationResult::rejected("Certificate not found"),
            Err(err) => {
                warn!(error = %err, "Certificate verification lookup failed");
                return VerificationResult::rejected("Verification is temporarily unavailable");
            }
        };

        let (valid, message) = match certificate.status {
            CertificateStatus::Issued => (true, "Certificate is valid".to_string()),
            CertificateStatus::Revoked => (
                false,
                format!(
                    "Certificate has been revoked: {}",
                    certificate.revoke_reason.as_deref().unwrap_or("no reason given")
                ),
            ),
            CertificateStatus::Pending => {
                (false, "Certificate has not yet been issued".to_string())
            }
        };

        let (student_name, course_title) = self.display_names(&certificate).await;
        VerificationResult {
            valid,
            certificate: Some(VerifiedCertificate::from(&certificate)),
            student_name,
            course_title,
            issue_date: Some(certificate.issue_date),
            message,
        }
    }

    /// Names from the snapshot, falling back to the live catalog
    async fn display_names(&self, certificate: &Certificate) -> (Option<String>, Option<String>) {
        let data = &certificate.certificate_data;
        let student_name = match non_empty(&data.student_name) {
            Some(name) => Some(name),
            None => self
                .store
                .find_student(certificate.user_id)
                .await
                .ok()
                .flatten()
                .map(|s| s.full_name),
        };
        let course_title = match non_empty(&data.course_title) {
            Some(title) => Some(title),
            None => self
                .store
                .find_course(certificate.course_id)
                .await
                .ok()
                .flatten()
                .map(|c| c.title),
        };
        (student_name, course_title)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn get_certificate(&self, certificate_id: i64) -> AppResult<Certificate> {
        self.store
            .find_certificate(certificate_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Certificate".to_string()))
    }

    pub async fn list_certificates(&self, filter: &CertificateFilter) -> AppResult<Vec<Certificate>> {
        self.store.list_certificates(filter).await
    }

    pub async fn get_stats(&self) -> AppResult<CertificateStats> {
        self.store.certificate_stats(Utc::now().date_naive()).await
    }

    /// Every certificate matching `filter` as CSV. The filter's page is
    /// ignored; rows are fetched in batches until the store runs out.
    #[instrument(skip(self, filter))]
    pub async fn export_csv(&self, filter: &CertificateFilter) -> AppResult<String> {
        let mut filter = filter.clone();
        filter.page = Pagination {
            limit: self.config.export_batch_size.max(1),
            offset: 0,
        };

        let mut rows: Vec<CertificateExportRow> = Vec::new();
        loop {
            let batch = self.list_certificates(&filter).await?;
            let fetched = batch.len() as i64;
            rows.extend(batch.iter().map(CertificateExportRow::from));
            if fetched < filter.page.limit {
                break;
            }
            filter.page.offset += fetched;
        }

        debug!(rows = rows.len(), "Certificate export assembled");
        Self::export_to_csv(&rows)
    }

    /// Serialize records as CSV with a header row
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Message recorded for a student the batch skipped
fn student_error_message(err: &AppError) -> String {
    match err {
        AppError::DuplicateEntry(field) if field == DUPLICATE_CERTIFICATE => ALREADY_ISSUED.to_string(),
        AppError::NotFound(resource) if resource == "Student" => STUDENT_NOT_FOUND.to_string(),
        AppError::NotFound(resource) if resource == "Course" => COURSE_NOT_FOUND.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_have_prefix_year_and_suffix() {
        let generator = CertificateNumberGenerator::new("BIT");
        let number = generator.generate_for_year(2025);
        assert!(number.starts_with("BIT2025"));
        assert_eq!(number.len(), 15);
        assert!(shared::validate_certificate_number(&number, "BIT").is_ok());
    }

    #[test]
    fn numbers_differ() {
        let generator = CertificateNumberGenerator::new("BIT");
        let a = generator.next_number();
        let b = generator.next_number();
        assert_ne!(a, b);
    }

    #[test]
    fn duplicate_errors_use_the_student_message() {
        let err = AppError::DuplicateEntry(DUPLICATE_CERTIFICATE.to_string());
        assert_eq!(student_error_message(&err), ALREADY_ISSUED);
        let err = AppError::NotFound("Student".to_string());
        assert_eq!(student_error_message(&err), STUDENT_NOT_FOUND);
    }

    #[test]
    fn csv_export_has_header() {
        #[derive(Serialize)]
        struct Row {
            number: &'static str,
            hours: u32,
        }
        let csv = CertificateService::export_to_csv(&[Row {
            number: "BIT2025AAAAAAAA",
            hours: 40,
        }])
        .unwrap();
        assert_eq!(csv, "number,hours\nBIT2025AAAAAAAA,40\n");
    }

    #[test]
    fn input_requires_students() {
        let input = GenerateCertificatesInput::new(9, vec![]);
        assert!(input.validate().is_err());
        let input = GenerateCertificatesInput::new(9, vec![501]);
        assert!(input.validate().is_ok());
    }
}
