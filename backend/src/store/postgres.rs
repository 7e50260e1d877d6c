//! PostgreSQL store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    Certificate, CertificateData, CertificateMetadata, CertificateStats, CertificateTemplate,
    CertificateType, CourseRecord, NewCertificate, NewCertificateTemplate, StudentRecord,
    TemplateChanges,
};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use super::{month_start, CertificateFilter, CertificateStore, DUPLICATE_CERTIFICATE, DUPLICATE_NUMBER};
use crate::error::{AppError, AppResult};

/// Unique index on `certificate_number`
const NUMBER_CONSTRAINT: &str = "certificates_number_key";

const CERTIFICATE_COLUMNS: &str = "id, certificate_number, certificate_type, user_id, course_id, \
     status, issue_date, completion_date, issued_by, revoked_by, revoked_at, revoke_reason, \
     certificate_data, metadata, created_at, updated_at";

const TEMPLATE_COLUMNS: &str = "id, name, description, html_content, css_styles, is_active, \
     is_default, created_by, created_at, updated_at";

/// Store backed by the LMS database
#[derive(Clone)]
pub struct PostgresStore {
    db: PgPool,
}

impl PostgresStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct CertificateRow {
    id: i64,
    certificate_number: String,
    certificate_type: String,
    user_id: i64,
    course_id: i64,
    status: String,
    issue_date: NaiveDate,
    completion_date: NaiveDate,
    issued_by: Option<i64>,
    revoked_by: Option<i64>,
    revoked_at: Option<DateTime<Utc>>,
    revoke_reason: Option<String>,
    certificate_data: Json<CertificateData>,
    metadata: Json<CertificateMetadata>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CertificateRow> for Certificate {
    type Error = AppError;

    fn try_from(row: CertificateRow) -> Result<Self, Self::Error> {
        Ok(Certificate {
            id: row.id,
            certificate_number: row.certificate_number,
            certificate_type: row.certificate_type.parse().map_err(AppError::Internal)?,
            user_id: row.user_id,
            course_id: row.course_id,
            status: row.status.parse().map_err(AppError::Internal)?,
            issue_date: row.issue_date,
            completion_date: row.completion_date,
            issued_by: row.issued_by,
            revoked_by: row.revoked_by,
            revoked_at: row.revoked_at,
            revoke_reason: row.revoke_reason,
            certificate_data: row.certificate_data.0,
            metadata: row.metadata.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct TemplateRow {
    id: i64,
    name: String,
    description: Option<String>,
    html_content: String,
    css_styles: Option<String>,
    is_active: bool,
    is_default: bool,
    created_by: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TemplateRow> for CertificateTemplate {
    fn from(row: TemplateRow) -> Self {
        CertificateTemplate {
            id: row.id,
            name: row.name,
            description: row.description,
            html_content: row.html_content,
            css_styles: row.css_styles,
            is_active: row.is_active,
            is_default: row.is_default,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct CourseRow {
    id: i64,
    title: String,
    duration_hours: Option<Decimal>,
    start_date: Option<NaiveDate>,
    instructor_names: Vec<String>,
}

fn certificate_from(row: Option<CertificateRow>) -> AppResult<Option<Certificate>> {
    row.map(Certificate::try_from).transpose()
}

/// Map unique violations on insert to the duplicate errors services expect
fn insert_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let field = if db_err.constraint() == Some(NUMBER_CONSTRAINT) {
                DUPLICATE_NUMBER
            } else {
                DUPLICATE_CERTIFICATE
            };
            return AppError::DuplicateEntry(field.to_string());
        }
    }
    AppError::DatabaseError(err)
}

#[async_trait]
impl CertificateStore for PostgresStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    async fn find_student(&self, id: i64) -> AppResult<Option<StudentRecord>> {
        let row = sqlx::query_as::<_, (i64, String, Option<String>)>(
            "SELECT id, full_name, email FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|(id, full_name, email)| StudentRecord {
            id,
            full_name,
            email,
        }))
    }

    async fn find_course(&self, id: i64) -> AppResult<Option<CourseRecord>> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT c.id, c.title, c.duration_hours, c.start_date,
                   COALESCE(
                       ARRAY_AGG(u.full_name ORDER BY u.full_name) FILTER (WHERE u.id IS NOT NULL),
                       '{}'
                   ) AS instructor_names
            FROM courses c
            LEFT JOIN course_instructors ci ON ci.course_id = c.id
            LEFT JOIN users u ON u.id = ci.instructor_id
            WHERE c.id = $1
            GROUP BY c.id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(|row| CourseRecord {
            id: row.id,
            title: row.title,
            duration_hours: row.duration_hours,
            start_date: row.start_date,
            instructor_names: row.instructor_names,
        }))
    }

    async fn find_template(&self, id: i64) -> AppResult<Option<CertificateTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM certificate_templates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_default_template(&self) -> AppResult<Option<CertificateTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM certificate_templates \
             WHERE is_default = true AND is_active = true LIMIT 1"
        ))
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn list_templates(&self, active_only: bool) -> AppResult<Vec<CertificateTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM certificate_templates \
             WHERE ($1 = false OR is_active = true) \
             ORDER BY is_default DESC, name ASC"
        ))
        .bind(active_only)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_template(
        &self,
        template: NewCertificateTemplate,
    ) -> AppResult<CertificateTemplate> {
        let mut tx = self.db.begin().await?;

        if template.is_default {
            sqlx::query("UPDATE certificate_templates SET is_default = false WHERE is_default = true")
                .execute(&mut *tx)
                .await?;
        }

        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"
            INSERT INTO certificate_templates (
                name, description, html_content, css_styles, is_active, is_default, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(&template.name)
        .bind(&template.description)
        .bind(&template.html_content)
        .bind(&template.css_styles)
        .bind(template.is_active)
        .bind(template.is_default)
        .bind(template.created_by)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn update_template(
        &self,
        id: i64,
        changes: TemplateChanges,
    ) -> AppResult<Option<CertificateTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            r#"
            UPDATE certificate_templates SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                html_content = COALESCE($4, html_content),
                css_styles = COALESCE($5, css_styles),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {TEMPLATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.description)
        .bind(&changes.html_content)
        .bind(&changes.css_styles)
        .bind(changes.is_active)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn set_default_template(&self, id: i64) -> AppResult<Option<CertificateTemplate>> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            "UPDATE certificate_templates SET is_default = false, updated_at = NOW() \
             WHERE is_default = true AND id <> $1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, TemplateRow>(&format!(
            "UPDATE certificate_templates SET is_default = true, updated_at = NOW() \
             WHERE id = $1 RETURNING {TEMPLATE_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        // Leave the previous default in place when the id is unknown.
        if row.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }
        tx.commit().await?;
        Ok(row.map(Into::into))
    }

    async fn find_active_certificate(
        &self,
        user_id: i64,
        course_id: i64,
        certificate_type: CertificateType,
    ) -> AppResult<Option<Certificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates \
             WHERE user_id = $1 AND course_id = $2 AND certificate_type = $3 \
               AND status <> 'revoked' \
             LIMIT 1"
        ))
        .bind(user_id)
        .bind(course_id)
        .bind(certificate_type.as_str())
        .fetch_optional(&self.db)
        .await?;

        certificate_from(row)
    }

    async fn insert_certificate(&self, certificate: NewCertificate) -> AppResult<Certificate> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            INSERT INTO certificates (
                certificate_number, certificate_type, user_id, course_id, status,
                issue_date, completion_date, issued_by, certificate_data, metadata
            )
            VALUES ($1, $2, $3, $4, 'issued', $5, $6, $7, $8, $9)
            RETURNING {CERTIFICATE_COLUMNS}
            "#
        ))
        .bind(&certificate.certificate_number)
        .bind(certificate.certificate_type.as_str())
        .bind(certificate.user_id)
        .bind(certificate.course_id)
        .bind(certificate.issue_date)
        .bind(certificate.completion_date)
        .bind(certificate.issued_by)
        .bind(Json(&certificate.certificate_data))
        .bind(Json(&certificate.metadata))
        .fetch_one(&self.db)
        .await
        .map_err(insert_error)?;

        row.try_into()
    }

    async fn find_certificate(&self, id: i64) -> AppResult<Option<Certificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        certificate_from(row)
    }

    async fn find_certificate_by_number(&self, number: &str) -> AppResult<Option<Certificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            "SELECT {CERTIFICATE_COLUMNS} FROM certificates WHERE certificate_number = $1"
        ))
        .bind(number)
        .fetch_optional(&self.db)
        .await?;

        certificate_from(row)
    }

    async fn revoke_certificate(
        &self,
        id: i64,
        revoked_by: i64,
        reason: &str,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<Certificate>> {
        let row = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            UPDATE certificates SET
                status = 'revoked',
                revoked_by = $2,
                revoked_at = $3,
                revoke_reason = $4,
                updated_at = $3
            WHERE id = $1 AND status <> 'revoked'
            RETURNING {CERTIFICATE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(revoked_by)
        .bind(revoked_at)
        .bind(reason)
        .fetch_optional(&self.db)
        .await?;

        certificate_from(row)
    }

    async fn list_certificates(&self, filter: &CertificateFilter) -> AppResult<Vec<Certificate>> {
        let rows = sqlx::query_as::<_, CertificateRow>(&format!(
            r#"
            SELECT {CERTIFICATE_COLUMNS}
            FROM certificates
            WHERE ($1::BIGINT IS NULL OR user_id = $1)
              AND ($2::BIGINT IS NULL OR course_id = $2)
              AND ($3::TEXT IS NULL OR certificate_type = $3)
              AND ($4::TEXT IS NULL OR status = $4)
              AND ($5::DATE IS NULL OR issue_date >= $5)
              AND ($6::DATE IS NULL OR issue_date <= $6)
            ORDER BY certificate_type ASC, created_at DESC, id DESC
            LIMIT $7 OFFSET $8
            "#
        ))
        .bind(filter.user_id)
        .bind(filter.course_id)
        .bind(filter.certificate_type.map(|t| t.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.issued.start)
        .bind(filter.issued.end)
        .bind(filter.page.limit.max(0))
        .bind(filter.page.offset.max(0))
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(Certificate::try_from).collect()
    }

    async fn certificate_stats(&self, today: NaiveDate) -> AppResult<CertificateStats> {
        let (
            total,
            issued,
            pending,
            revoked,
            course_completion,
            module_completion,
            issued_this_month,
            certified_students,
        ) = sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64, i64)>(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE status = 'issued'),
                COUNT(*) FILTER (WHERE status = 'pending'),
                COUNT(*) FILTER (WHERE status = 'revoked'),
                COUNT(*) FILTER (WHERE certificate_type = 'course_completion'),
                COUNT(*) FILTER (WHERE certificate_type = 'module_completion'),
                COUNT(*) FILTER (WHERE status = 'issued' AND issue_date BETWEEN $1 AND $2),
                COUNT(DISTINCT user_id) FILTER (WHERE status = 'issued')
            FROM certificates
            "#,
        )
        .bind(month_start(today))
        .bind(today)
        .fetch_one(&self.db)
        .await?;

        Ok(CertificateStats {
            total,
            issued,
            pending,
            revoked,
            course_completion,
            module_completion,
            issued_this_month,
            certified_students,
        })
    }
}
