//! Persistence for certificates, templates and the LMS catalog they read
//!
//! Services only see the [`CertificateStore`] trait. Both backends enforce the
//! issuance invariants themselves: a unique certificate number, and at most
//! one non-revoked certificate per (student, course, type). A violated
//! invariant surfaces as [`AppError::DuplicateEntry`] naming
//! [`DUPLICATE_CERTIFICATE`] or [`DUPLICATE_NUMBER`].

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use shared::{
    Certificate, CertificateStats, CertificateStatus, CertificateTemplate, CertificateType,
    CourseRecord, DateRange, NewCertificate, NewCertificateTemplate, Pagination, StudentRecord,
    TemplateChanges,
};

use crate::error::AppResult;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// `DuplicateEntry` field for a second live certificate on the same tuple
pub const DUPLICATE_CERTIFICATE: &str = "certificate";

/// `DuplicateEntry` field for a certificate number collision
pub const DUPLICATE_NUMBER: &str = "certificate_number";

/// Criteria for listing certificates; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct CertificateFilter {
    pub user_id: Option<i64>,
    pub course_id: Option<i64>,
    pub certificate_type: Option<CertificateType>,
    pub status: Option<CertificateStatus>,
    pub issued: DateRange,
    pub page: Pagination,
}

impl CertificateFilter {
    pub fn matches(&self, certificate: &Certificate) -> bool {
        self.user_id.map_or(true, |id| certificate.user_id == id)
            && self.course_id.map_or(true, |id| certificate.course_id == id)
            && self
                .certificate_type
                .map_or(true, |t| certificate.certificate_type == t)
            && self.status.map_or(true, |s| certificate.status == s)
            && self.issued.contains(certificate.issue_date)
    }
}

#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Cheap round trip used by the health endpoint
    async fn ping(&self) -> AppResult<()>;

    // Catalog (read-only)

    async fn find_student(&self, id: i64) -> AppResult<Option<StudentRecord>>;

    async fn find_course(&self, id: i64) -> AppResult<Option<CourseRecord>>;

    // Templates

    async fn find_template(&self, id: i64) -> AppResult<Option<CertificateTemplate>>;

    /// The active template flagged as default, if any
    async fn find_default_template(&self) -> AppResult<Option<CertificateTemplate>>;

    /// Default first, then by name
    async fn list_templates(&self, active_only: bool) -> AppResult<Vec<CertificateTemplate>>;

    /// Insert a template. When `is_default` is set every other default is
    /// cleared in the same step.
    async fn insert_template(&self, template: NewCertificateTemplate)
        -> AppResult<CertificateTemplate>;

    async fn update_template(
        &self,
        id: i64,
        changes: TemplateChanges,
    ) -> AppResult<Option<CertificateTemplate>>;

    /// Make `id` the only default template
    async fn set_default_template(&self, id: i64) -> AppResult<Option<CertificateTemplate>>;

    // Certificates

    /// The non-revoked certificate for the tuple, if one exists
    async fn find_active_certificate(
        &self,
        user_id: i64,
        course_id: i64,
        certificate_type: CertificateType,
    ) -> AppResult<Option<Certificate>>;

    /// Insert an issued certificate
    async fn insert_certificate(&self, certificate: NewCertificate) -> AppResult<Certificate>;

    async fn find_certificate(&self, id: i64) -> AppResult<Option<Certificate>>;

    async fn find_certificate_by_number(&self, number: &str) -> AppResult<Option<Certificate>>;

    /// Move a non-revoked certificate to `revoked`. Returns `None` when the
    /// certificate does not exist or is already revoked.
    async fn revoke_certificate(
        &self,
        id: i64,
        revoked_by: i64,
        reason: &str,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<Certificate>>;

    /// Ordered by type, then newest first
    async fn list_certificates(&self, filter: &CertificateFilter) -> AppResult<Vec<Certificate>>;

    /// Aggregates; `today` decides the current calendar month
    async fn certificate_stats(&self, today: NaiveDate) -> AppResult<CertificateStats>;
}

/// First day of the month containing `today`
pub(crate) fn month_start(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{CertificateData, CertificateMetadata};

    fn certificate() -> Certificate {
        let date = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        Certificate {
            id: 1,
            certificate_number: "BIT2025AB12CD34".to_string(),
            certificate_type: CertificateType::CourseCompletion,
            user_id: 501,
            course_id: 9,
            status: CertificateStatus::Issued,
            issue_date: date,
            completion_date: date,
            issued_by: Some(1),
            revoked_by: None,
            revoked_at: None,
            revoke_reason: None,
            certificate_data: CertificateData::default(),
            metadata: CertificateMetadata::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn month_start_is_first_day() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn empty_filter_matches_everything() {
        let certificate = certificate();
        assert!(CertificateFilter::default().matches(&certificate));
    }

    #[test]
    fn filter_checks_each_field() {
        let certificate = certificate();
        let filter = CertificateFilter {
            user_id: Some(certificate.user_id + 1),
            ..Default::default()
        };
        assert!(!filter.matches(&certificate));

        let filter = CertificateFilter {
            status: Some(CertificateStatus::Revoked),
            ..Default::default()
        };
        assert!(!filter.matches(&certificate));

        let filter = CertificateFilter {
            course_id: Some(certificate.course_id),
            certificate_type: Some(certificate.certificate_type),
            ..Default::default()
        };
        assert!(filter.matches(&certificate));

        let filter = CertificateFilter {
            issued: DateRange {
                start: NaiveDate::from_ymd_opt(2025, 4, 1),
                end: None,
            },
            ..Default::default()
        };
        assert!(!filter.matches(&certificate));
    }
}
