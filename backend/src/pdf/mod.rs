//! HTML to PDF rendering through a headless browser
//!
//! The renderer never talks to a browser directly. It borrows a handle from
//! a [`BrowserPool`], which launches browser processes lazily through a
//! [`BrowserLauncher`] and bounds how many renders run at once. Each render
//! opens its own page inside the borrowed browser and closes it before the
//! handle goes back to the pool.

#[cfg(feature = "chromium")]
mod chromium;
mod pool;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::{Orientation, PageGeometry, PaperFormat};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::PdfConfig;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumLauncher;
pub use pool::{BrowserPool, PoolStatus, PooledBrowser};

/// PDF renderer errors
#[derive(Error, Debug)]
pub enum PdfError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// The browser process itself failed; its handle is discarded.
    #[error("Browser failure: {0}")]
    Browser(String),

    /// Loading or capturing one page failed; the browser stays usable.
    #[error("Page failure: {0}")]
    Page(String),

    #[error("Rendering did not finish within {0}s")]
    Timeout(u64),

    #[error("Browser pool is closed")]
    PoolClosed,

    #[error("Invalid render options: {0}")]
    InvalidOptions(String),
}

impl PdfError {
    /// Whether the browser that produced this error should be thrown away
    pub fn poisons_browser(&self) -> bool {
        matches!(self, PdfError::Browser(_) | PdfError::Timeout(_))
    }
}

/// Page margins in millimetres
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PageMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl PageMargin {
    pub fn uniform(mm: f64) -> Self {
        Self {
            top: mm,
            right: mm,
            bottom: mm,
            left: mm,
        }
    }
}

/// Options for [`PdfRenderer::generate_pdf`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PdfOptions {
    pub format: PaperFormat,
    pub orientation: Orientation,
    /// Certificates rely on decorative backgrounds, so this defaults to on.
    pub print_background: bool,
    pub margin: PageMargin,
    pub display_header_footer: bool,
    pub prefer_css_page_size: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PaperFormat::A4,
            orientation: Orientation::Portrait,
            print_background: true,
            margin: PageMargin::default(),
            display_header_footer: false,
            prefer_css_page_size: false,
        }
    }
}

impl PdfOptions {
    /// Fixed output for certificates: A4 landscape, backgrounds, no margins
    pub fn certificate() -> Self {
        Self {
            orientation: Orientation::Landscape,
            ..Self::default()
        }
    }

    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.format, self.orientation)
    }

    pub fn validate(&self) -> Result<(), PdfError> {
        let m = &self.margin;
        if [m.top, m.right, m.bottom, m.left]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(PdfError::InvalidOptions(
                "margins must be non-negative".to_string(),
            ));
        }
        let (width, height) = self.geometry().size_mm();
        if m.left + m.right >= width || m.top + m.bottom >= height {
            return Err(PdfError::InvalidOptions(
                "margins leave no printable area".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Options for [`PdfRenderer::generate_screenshot`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScreenshotOptions {
    /// Capture the whole document instead of only the viewport
    pub full_page: bool,
    pub format: ImageFormat,
    /// JPEG quality, 0-100
    pub quality: Option<u8>,
}

impl Default for ScreenshotOptions {
    fn default() -> Self {
        Self {
            full_page: true,
            format: ImageFormat::Png,
            quality: None,
        }
    }
}

impl ScreenshotOptions {
    pub fn validate(&self) -> Result<(), PdfError> {
        match (self.format, self.quality) {
            (ImageFormat::Png, Some(_)) => Err(PdfError::InvalidOptions(
                "quality only applies to jpeg".to_string(),
            )),
            (_, Some(q)) if q > 100 => Err(PdfError::InvalidOptions(
                "quality must be between 0 and 100".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

/// Virtual window every page is rendered in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            device_scale_factor: 2.0,
        }
    }
}

/// One running browser process
///
/// Implementations open a fresh page per call, wait for fonts and images,
/// capture, and close the page again even when capture fails.
#[async_trait]
pub trait BrowserHandle: Send + Sync {
    async fn print_pdf(
        &self,
        html: &str,
        options: &PdfOptions,
        viewport: &Viewport,
    ) -> Result<Vec<u8>, PdfError>;

    async fn screenshot(
        &self,
        html: &str,
        options: &ScreenshotOptions,
        viewport: &Viewport,
    ) -> Result<Vec<u8>, PdfError>;

    /// Terminate the browser process
    async fn close(&self) -> Result<(), PdfError>;
}

/// Starts browser processes for the pool
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>, PdfError>;
}

/// Launcher for builds without a browser; every launch fails
pub struct DisabledLauncher;

#[async_trait]
impl BrowserLauncher for DisabledLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>, PdfError> {
        Err(PdfError::Launch(
            "this build has no browser support".to_string(),
        ))
    }
}

/// Converts complete HTML documents into PDF bytes or preview images
pub struct PdfRenderer {
    pool: BrowserPool,
    viewport: Viewport,
    load_timeout: Duration,
}

impl PdfRenderer {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: &PdfConfig) -> Self {
        Self::with_settings(
            launcher,
            config.pool_size,
            Viewport {
                width: config.viewport_width,
                height: config.viewport_height,
                device_scale_factor: config.device_scale_factor,
            },
            Duration::from_secs(config.load_timeout_secs),
        )
    }

    pub fn with_settings(
        launcher: Arc<dyn BrowserLauncher>,
        pool_size: usize,
        viewport: Viewport,
        load_timeout: Duration,
    ) -> Self {
        Self {
            pool: BrowserPool::new(launcher, pool_size),
            viewport,
            load_timeout,
        }
    }

    /// Render `html` (a complete document) to PDF bytes
    #[instrument(skip(self, html), fields(html_len = html.len(), orientation = options.orientation.as_str()))]
    pub async fn generate_pdf(&self, html: &str, options: &PdfOptions) -> Result<Vec<u8>, PdfError> {
        options.validate()?;
        let browser = self.pool.acquire().await?;
        let result = tokio::time::timeout(
            self.load_timeout,
            browser.print_pdf(html, options, &self.viewport),
        )
        .await;
        let bytes = self.settle(browser, result).await?;
        debug!(bytes = bytes.len(), "PDF rendered");
        Ok(bytes)
    }

    /// Render `html` to a PNG or JPEG image, for template previews
    #[instrument(skip(self, html), fields(html_len = html.len()))]
    pub async fn generate_screenshot(
        &self,
        html: &str,
        options: &ScreenshotOptions,
    ) -> Result<Vec<u8>, PdfError> {
        options.validate()?;
        let browser = self.pool.acquire().await?;
        let result = tokio::time::timeout(
            self.load_timeout,
            browser.screenshot(html, options, &self.viewport),
        )
        .await;
        self.settle(browser, result).await
    }

    /// Shut down every browser process. Later renders fail with
    /// [`PdfError::PoolClosed`].
    pub async fn close_browser(&self) {
        self.pool.close().await;
    }

    pub fn health(&self) -> PoolStatus {
        self.pool.health()
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    async fn settle(
        &self,
        browser: PooledBrowser<'_>,
        result: Result<Result<Vec<u8>, PdfError>, tokio::time::error::Elapsed>,
    ) -> Result<Vec<u8>, PdfError> {
        let outcome = result.unwrap_or_else(|_| Err(PdfError::Timeout(self.load_timeout.as_secs())));
        if let Err(err) = &outcome {
            if err.poisons_browser() {
                warn!(error = %err, "Discarding browser after failure");
                let handle = browser.discard();
                if let Err(close_err) = handle.close().await {
                    debug!(error = %close_err, "Browser close after failure also failed");
                }
            }
        }
        outcome
    }
}
