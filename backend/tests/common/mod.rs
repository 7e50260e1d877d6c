//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use certificate_backend::config::Config;
use certificate_backend::error::{AppError, AppResult};
use certificate_backend::pdf::{
    BrowserHandle, BrowserLauncher, PdfError, PdfOptions, PdfRenderer, ScreenshotOptions, Viewport,
};
use certificate_backend::store::{CertificateFilter, CertificateStore, MemoryStore};
use certificate_backend::AppState;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    Certificate, CertificateStats, CertificateTemplate, CertificateType, CourseRecord,
    NewCertificate, NewCertificateTemplate, StudentRecord, TemplateChanges, DEFAULT_TEMPLATE_CSS,
    DEFAULT_TEMPLATE_HTML,
};

// ============================================================================
// Fake browser
// ============================================================================

/// What the next render does
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behaviour {
    Render,
    /// Page-level failure; the browser survives
    FailPage,
    /// Browser-level failure; the pool must discard the browser
    Crash,
    /// Never finishes; the renderer must time out
    Hang,
}

#[derive(Default)]
pub struct BrowserStats {
    pub launches: AtomicUsize,
    pub browsers_closed: AtomicUsize,
    pub pages_opened: AtomicUsize,
    pub pages_closed: AtomicUsize,
    pub active_pages: AtomicUsize,
    pub max_active_pages: AtomicUsize,
}

impl BrowserStats {
    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Launches in-process fake browsers whose "PDF" is a small text document
/// carrying the page box and the HTML it was given.
pub struct FakeLauncher {
    pub stats: Arc<BrowserStats>,
    behaviour: Arc<Mutex<Behaviour>>,
    render_delay: Duration,
}

impl FakeLauncher {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(render_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            stats: Arc::new(BrowserStats::default()),
            behaviour: Arc::new(Mutex::new(Behaviour::Render)),
            render_delay,
        })
    }

    pub fn set_behaviour(&self, behaviour: Behaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn launches(&self) -> usize {
        BrowserStats::get(&self.stats.launches)
    }
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>, PdfError> {
        self.stats.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeBrowser {
            stats: self.stats.clone(),
            behaviour: self.behaviour.clone(),
            render_delay: self.render_delay,
        }))
    }
}

struct FakeBrowser {
    stats: Arc<BrowserStats>,
    behaviour: Arc<Mutex<Behaviour>>,
    render_delay: Duration,
}

/// Counts a page as closed when dropped, which also covers cancelled renders
struct OpenPage(Arc<BrowserStats>);

impl OpenPage {
    fn open(stats: &Arc<BrowserStats>) -> Self {
        stats.pages_opened.fetch_add(1, Ordering::SeqCst);
        let active = stats.active_pages.fetch_add(1, Ordering::SeqCst) + 1;
        stats.max_active_pages.fetch_max(active, Ordering::SeqCst);
        Self(stats.clone())
    }
}

impl Drop for OpenPage {
    fn drop(&mut self) {
        self.0.active_pages.fetch_sub(1, Ordering::SeqCst);
        self.0.pages_closed.fetch_add(1, Ordering::SeqCst);
    }
}

impl FakeBrowser {
    async fn render(&self) -> Result<OpenPage, PdfError> {
        let behaviour = *self.behaviour.lock().unwrap();
        let page = OpenPage::open(&self.stats);
        if !self.render_delay.is_zero() {
            tokio::time::sleep(self.render_delay).await;
        }
        match behaviour {
            Behaviour::Render => Ok(page),
            Behaviour::FailPage => Err(PdfError::Page("net::ERR_FAILED".to_string())),
            Behaviour::Crash => Err(PdfError::Browser("target crashed".to_string())),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(page)
            }
        }
    }
}

#[async_trait]
impl BrowserHandle for FakeBrowser {
    async fn print_pdf(
        &self,
        html: &str,
        options: &PdfOptions,
        _viewport: &Viewport,
    ) -> Result<Vec<u8>, PdfError> {
        let _page = self.render().await?;
        let (width, height) = options.geometry().size_pt();
        Ok(format!(
            "%PDF-1.7\n/MediaBox [0 0 {:.2} {:.2}]\n%HTML {}\n%%EOF\n",
            width, height, html
        )
        .into_bytes())
    }

    async fn screenshot(
        &self,
        _html: &str,
        _options: &ScreenshotOptions,
        _viewport: &Viewport,
    ) -> Result<Vec<u8>, PdfError> {
        let _page = self.render().await?;
        Ok(b"\x89PNG\r\n\x1a\nfake".to_vec())
    }

    async fn close(&self) -> Result<(), PdfError> {
        self.stats.browsers_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// The `/MediaBox` line of a fake PDF
pub fn media_box(pdf: &[u8]) -> Option<String> {
    String::from_utf8_lossy(pdf)
        .lines()
        .find(|line| line.starts_with("/MediaBox"))
        .map(str::to_string)
}

/// The HTML a fake PDF was rendered from
pub fn rendered_html(pdf: &[u8]) -> String {
    let text = String::from_utf8_lossy(pdf);
    let start = text.find("%HTML ").map(|i| i + 6).unwrap_or(0);
    let end = text.rfind("\n%%EOF").unwrap_or(text.len());
    text[start..end].to_string()
}

pub fn renderer(launcher: Arc<FakeLauncher>, pool_size: usize, timeout: Duration) -> PdfRenderer {
    PdfRenderer::with_settings(launcher, pool_size, Viewport::default(), timeout)
}

// ============================================================================
// Application fixtures
// ============================================================================

pub const ADMIN_ID: i64 = 1;
pub const COURSE_ID: i64 = 9;

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub launcher: Arc<FakeLauncher>,
}

pub fn test_config() -> Config {
    Config::default()
}

/// Memory store with students 501-503, course 9 and the built-in default
/// template
pub async fn seeded_app_with(config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    for (id, name) in [(501, "Somchai Jaidee"), (502, "Jane Doe"), (503, "Ada Lovelace")] {
        store.insert_student(StudentRecord {
            id,
            full_name: name.to_string(),
            email: Some(format!("student{}@example.com", id)),
        });
    }
    store.insert_course(CourseRecord {
        id: COURSE_ID,
        title: "Introduction to Data Science".to_string(),
        duration_hours: Some(Decimal::new(40, 0)),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 6),
        instructor_names: vec!["Dr. John Smith".to_string()],
    });
    store
        .insert_template(NewCertificateTemplate {
            name: "Classic".to_string(),
            description: None,
            html_content: DEFAULT_TEMPLATE_HTML.to_string(),
            css_styles: Some(DEFAULT_TEMPLATE_CSS.to_string()),
            is_active: true,
            is_default: true,
            created_by: ADMIN_ID,
        })
        .await
        .unwrap();

    let launcher = FakeLauncher::new();
    let state = AppState::new(config, store.clone(), launcher.clone());
    TestApp {
        state,
        store,
        launcher,
    }
}

pub async fn seeded_app() -> TestApp {
    seeded_app_with(test_config()).await
}

/// `^BIT\d{4}[A-Z0-9]{8}$`
pub fn is_certificate_number(number: &str) -> bool {
    let Some(rest) = number.strip_prefix("BIT") else {
        return false;
    };
    rest.len() == 12
        && rest[..4].chars().all(|c| c.is_ascii_digit())
        && rest[4..]
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
}

// ============================================================================
// Failing store
// ============================================================================

/// Store whose every call fails, as if the database were unreachable
pub struct UnavailableStore;

fn offline<T>() -> AppResult<T> {
    Err(AppError::Internal("store offline".to_string()))
}

#[async_trait]
impl CertificateStore for UnavailableStore {
    async fn ping(&self) -> AppResult<()> {
        offline()
    }
    async fn find_student(&self, _id: i64) -> AppResult<Option<StudentRecord>> {
        offline()
    }
    async fn find_course(&self, _id: i64) -> AppResult<Option<CourseRecord>> {
        offline()
    }
    async fn find_template(&self, _id: i64) -> AppResult<Option<CertificateTemplate>> {
        offline()
    }
    async fn find_default_template(&self) -> AppResult<Option<CertificateTemplate>> {
        offline()
    }
    async fn list_templates(&self, _active_only: bool) -> AppResult<Vec<CertificateTemplate>> {
        offline()
    }
    async fn insert_template(
        &self,
        _template: NewCertificateTemplate,
    ) -> AppResult<CertificateTemplate> {
        offline()
    }
    async fn update_template(
        &self,
        _id: i64,
        _changes: TemplateChanges,
    ) -> AppResult<Option<CertificateTemplate>> {
        offline()
    }
    async fn set_default_template(&self, _id: i64) -> AppResult<Option<CertificateTemplate>> {
        offline()
    }
    async fn find_active_certificate(
        &self,
        _user_id: i64,
        _course_id: i64,
        _certificate_type: CertificateType,
    ) -> AppResult<Option<Certificate>> {
        offline()
    }
    async fn insert_certificate(&self, _certificate: NewCertificate) -> AppResult<Certificate> {
        offline()
    }
    async fn find_certificate(&self, _id: i64) -> AppResult<Option<Certificate>> {
        offline()
    }
    async fn find_certificate_by_number(&self, _number: &str) -> AppResult<Option<Certificate>> {
        offline()
    }
    async fn revoke_certificate(
        &self,
        _id: i64,
        _revoked_by: i64,
        _reason: &str,
        _revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<Certificate>> {
        offline()
    }
    async fn list_certificates(&self, _filter: &CertificateFilter) -> AppResult<Vec<Certificate>> {
        offline()
    }
    async fn certificate_stats(&self, _today: NaiveDate) -> AppResult<CertificateStats> {
        offline()
    }
}

/// Serves certificate reads from a memory store while every other lookup
/// fails, templates included
pub struct CertificatesOnlyStore(pub Arc<MemoryStore>);

#[async_trait]
impl CertificateStore for CertificatesOnlyStore {
    async fn ping(&self) -> AppResult<()> {
        offline()
    }
    async fn find_student(&self, _id: i64) -> AppResult<Option<StudentRecord>> {
        offline()
    }
    async fn find_course(&self, _id: i64) -> AppResult<Option<CourseRecord>> {
        offline()
    }
    async fn find_template(&self, _id: i64) -> AppResult<Option<CertificateTemplate>> {
        offline()
    }
    async fn find_default_template(&self) -> AppResult<Option<CertificateTemplate>> {
        offline()
    }
    async fn list_templates(&self, _active_only: bool) -> AppResult<Vec<CertificateTemplate>> {
        offline()
    }
    async fn insert_template(
        &self,
        _template: NewCertificateTemplate,
    ) -> AppResult<CertificateTemplate> {
        offline()
    }
    async fn update_template(
        &self,
        _id: i64,
        _changes: TemplateChanges,
    ) -> AppResult<Option<CertificateTemplate>> {
        offline()
    }
    async fn set_default_template(&self, _id: i64) -> AppResult<Option<CertificateTemplate>> {
        offline()
    }
    async fn find_active_certificate(
        &self,
        user_id: i64,
        course_id: i64,
        certificate_type: CertificateType,
    ) -> AppResult<Option<Certificate>> {
        self.0
            .find_active_certificate(user_id, course_id, certificate_type)
            .await
    }
    async fn insert_certificate(&self, _certificate: NewCertificate) -> AppResult<Certificate> {
        offline()
    }
    async fn find_certificate(&self, id: i64) -> AppResult<Option<Certificate>> {
        self.0.find_certificate(id).await
    }
    async fn find_certificate_by_number(&self, number: &str) -> AppResult<Option<Certificate>> {
        self.0.find_certificate_by_number(number).await
    }
    async fn revoke_certificate(
        &self,
        _id: i64,
        _revoked_by: i64,
        _reason: &str,
        _revoked_at: DateTime<Utc>,
    ) -> AppResult<Option<Certificate>> {
        offline()
    }
    async fn list_certificates(&self, filter: &CertificateFilter) -> AppResult<Vec<Certificate>> {
        self.0.list_certificates(filter).await
    }
    async fn certificate_stats(&self, _today: NaiveDate) -> AppResult<CertificateStats> {
        offline()
    }
}
