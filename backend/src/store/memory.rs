//! In-process store for development and tests

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rust_decimal::Decimal;
use shared::{
    Certificate, CertificateStats, CertificateStatus, CertificateTemplate, CertificateType,
    CourseRecord, NewCertificate, NewCertificateTemplate, StudentRecord, TemplateChanges,
};

use super::{month_start, CertificateFilter, CertificateStore, DUPLICATE_CERTIFICATE, DUPLICATE_NUMBER};
use crate::error::{AppError, AppResult};

type ActiveKey = (i64, i64, CertificateType);

/// Store backed by concurrent maps
///
/// Uniqueness is enforced through the `DashMap` entry API: the live-tuple
/// index and the number index are claimed before a certificate is stored, so
/// two concurrent inserts for the same student cannot both succeed.
#[derive(Default)]
pub struct MemoryStore {
    students: DashMap<i64, StudentRecord>,
    courses: DashMap<i64, CourseRecord>,
    templates: RwLock<BTreeMap<i64, CertificateTemplate>>,
    certificates: DashMap<i64, Certificate>,
    active: DashMap<ActiveKey, i64>,
    numbers: DashMap<String, i64>,
    next_template_id: AtomicI64,
    next_certificate_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with a few students and one course, for local runs without a
    /// database
    pub fn with_demo_catalog() -> Self {
        let store = Self::new();
        for (id, name) in [(501, "Somchai Jaidee"), (502, "Jane Doe"), (503, "Ada Lovelace")] {
            store.insert_student(StudentRecord {
                id,
                full_name: name.to_string(),
                email: None,
            });
        }
        store.insert_course(CourseRecord {
            id: 9,
            title: "Introduction to Data Science".to_string(),
            duration_hours: Some(Decimal::new(40, 0)),
            start_date: None,
            instructor_names: vec!["Dr. John Smith".to_string()],
        });
        store
    }

    pub fn insert_student(&self, student: StudentRecord) {
        self.students.insert(student.id, student);
    }

    pub fn insert_course(&self, course: CourseRecord) {
        self.courses.insert(course.id, course);
    }

    /// Store a certificate as-is, bypassing issuance rules. Used to load
    /// records created by older releases.
    pub fn import_certificate(&self, certificate: Certificate) {
        if !certificate.is_revoked() {
            self.active.insert(
                (certificate.user_id, certificate.course_id, certificate.certificate_type),
                certificate.id,
            );
        }
        self.numbers
            .insert(certificate.certificate_number.clone(), certificate.id);
        self.next_certificate_id
            .fetch_max(certificate.id, Ordering::AcqRel);
        self.certificates.insert(certificate.id, certificate);
    }

    fn read_templates(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, BTreeMap<i64, CertificateTemplate>> {
        self.templates.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_templates(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, BTreeMap<i64, CertificateTemplate>> {
        self.templates.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl CertificateStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    async fn find_student(&self, id: i64) -> AppResult<Option<StudentRecord>> {
        Ok(self.students.get(&id).map(|s| s.clone()))
    }

    async fn find_course(&self, id: i64) -> AppResult<Option<CourseRecord>> {
        Ok(self.courses.get(&id).map(|c| c.clone()))
    }

    async fn find_template(&self, id: i64) -> AppResult<Option<CertificateTemplate>> {
        Ok(self.read_templates().get(&id).cloned())
    }

    async fn find_default_template(&self) -> AppResult<Option<CertificateTemplate>> {
        Ok(self
            .read_templates()
            .values()
            .find(|t| t.is_default && t.is_active)
            .cloned())
    }

    async fn list_templates(&self, active_only: bool) -> AppResult<Vec<CertificateTemplate>> {
        let mut templates: Vec<_> = self
            .read_templates()
            .values()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect();
        templates.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(templates)
    }

    async fn insert_template(
        &self,
        template: NewCertificateTemplate,
    ) -> AppResult<CertificateTemplate> {
        let now = Utc::now();
        let id = self.next_template_id.fetch_add(1, Ordering::AcqRel) + 1;
        let record = CertificateTemplate {
            id,
            name: template.name,
            description: template.description,
            html_content: template.html_content,
            css_styles: template.css_styles,
            is_active: template.is_active,
            is_default: template.is_default,
            created_by: Some(template.created_by),
            created_at: now,
            updated_at: now,
        };

        let mut templates = self.write_templates();
        if record.is_default {
            for other in templates.values_mut() {
                other.is_default = false;
            }
        }
        templates.insert(id, record.clone());
        Ok(record)
    }

    async fn update_template(
        &self,
        id: i64,
        changes: TemplateChanges,
    ) -> AppResult<Option<CertificateTemplate>> {
        let mut templates = self.write_templates();
        let Some(template) = templates.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            template.name = name;
        }
        if let Some(description) = changes.description {
            template.description = Some(description);
        }
        if let Some(html) = changes.html_content {
            template.html_content = html;
        }
        if let Some(css) = changes.css_styles {
            template.css_styles = Some(css);
        }
        if let Some(active) = changes.is_active {
            template.is_active = active;
        }
        template.updated_at = Utc::now();
        Ok(Some(template.clone()))
    }

    async fn set_default_template(&self, id: i64) -> AppResult<Option<CertificateTemplate>> {
        let mut templates = self.write_templates();
        if !templates.contains_key(&id) {
            return Ok(None);
        }
        let now = Utc::now();
        for (template_id, template) in templates.iter_mut() {
            let is_default = *template_id == id;
            if template.is_default != is_default {
                template.is_default = is_default;
                template.updated_at = now;
            }
        }
        Ok(templates.get(&id).cloned())
    }

    async fn find_active_certificate(
        &self,
        user_id: i64,
        course_id: i64,
        certificate_type: CertificateType,
    ) -> AppResult<Option<Certificate>> {
        let id = match self.active.get(&(user_id, course_id, certificate_type)) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.certificates.get(&id).map(|c| c.clone()))
    }

    async fn insert_certificate(&self, certificate: NewCertificate) -> AppResult<Certificate> {
        let key = (
            certificate.user_id,
            certificate.course_id,
            certificate.certificate_type,
        );

        // Lock order: active, then numbers, then certificates.
        let Entry::Vacant(active_slot) = self.active.entry(key) else {
            return Err(AppError::DuplicateEntry(DUPLICATE_CERTIFICATE.to_string()));
        };
        let Entry::Vacant(number_slot) = self.numbers.entry(certificate.certificate_number.clone())
        else {
            return Err(AppError::DuplicateEntry(DUPLICATE_NUMBER.to_string()));
        };

        let id = self.next_certificate_id.fetch_add(1, Ordering::AcqRel) + 1;
        let now = Utc::now();
        let record = Certificate {
            id,
            certificate_number: certificate.certificate_number,
            certificate_type: certificate.certificate_type,
            user_id: certificate.user_id,
            course_id: certificate.course_id,
            status: CertificateStatus::Issued,
            issue_date: certificate.issue_date,
            completion_date: certificate.completion_date,
            issued_by: Some(certificate.issued_by),
            revoked_by: None,
            revoked_at: None,
            revoke_reason: None,
            certificate_data: certificate.certificate_data,
            metadata: certificate.metadata,
            created_at: now,
            updated_at: now,
        };
        self.certificates.insert(id, record.clone());
        number_slot.insert(id);
        active_slot.insert(id);
        Ok(record)
    }

    async fn find_certificate(&self, id: i64) -> AppResult<Option<Certificate>> {
        Ok(self.certificates.get(&id).map(|c| c.clone()))
    }

    async fn find_certificate_by_number(&self, number: &str) -> AppResult<Option<Certificate>> {
        let id = match self.numbers.get(number) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.certificates.get(&id).map(|c| c.clone()))
    }

    async fn revoke_certificate(
        &self,
        id: i64,
        revoked_by: i64,
        reason: &str,
        revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<Certificate>> {
        let revoked = {
            let Some(mut certificate) = self.certificates.get_mut(&id) else {
                return Ok(None);
            };
            if certificate.is_revoked() {
                return Ok(None);
            }
            certificate.status = CertificateStatus::Revoked;
            certificate.revoked_by = Some(revoked_by);
            certificate.revoked_at = Some(revoked_at);
            certificate.revoke_reason = Some(reason.to_string());
            certificate.updated_at = revoked_at;
            certificate.clone()
        };
        // Released the certificate shard before touching the index.
        self.active.remove_if(
            &(revoked.user_id, revoked.course_id, revoked.certificate_type),
            |_, active_id| *active_id == id,
        );
        Ok(Some(revoked))
    }

    async fn list_certificates(&self, filter: &CertificateFilter) -> AppResult<Vec<Certificate>> {
        let mut certificates: Vec<Certificate> = self
            .certificates
            .iter()
            .filter(|c| filter.matches(c.value()))
            .map(|c| c.value().clone())
            .collect();
        certificates.sort_by_key(|c| (c.certificate_type, Reverse(c.created_at), Reverse(c.id)));
        Ok(certificates
            .into_iter()
            .skip(filter.page.offset.max(0) as usize)
            .take(filter.page.limit.max(0) as usize)
            .collect())
    }

    async fn certificate_stats(&self, today: NaiveDate) -> AppResult<CertificateStats> {
        let month = month_start(today);
        let mut stats = CertificateStats::default();
        let mut students = HashSet::new();
        for entry in self.certificates.iter() {
            let certificate = entry.value();
            stats.total += 1;
            match certificate.status {
                CertificateStatus::Issued => {
                    stats.issued += 1;
                    students.insert(certificate.user_id);
                    if certificate.issue_date >= month && certificate.issue_date <= today {
                        stats.issued_this_month += 1;
                    }
                }
                CertificateStatus::Pending => stats.pending += 1,
                CertificateStatus::Revoked => stats.revoked += 1,
            }
            match certificate.certificate_type {
                CertificateType::CourseCompletion => stats.course_completion += 1,
                CertificateType::ModuleCompletion => stats.module_completion += 1,
            }
        }
        stats.certified_students = students.len() as i64;
        Ok(stats)
    }
}
