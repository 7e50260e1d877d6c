//! Chromium driver over the DevTools protocol

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use shared::{mm_to_inches, Orientation};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{BrowserHandle, BrowserLauncher, ImageFormat, PdfError, PdfOptions, ScreenshotOptions, Viewport};
use crate::config::PdfConfig;

/// Resolves once the document, its web fonts and every image have settled.
/// Images that fail to load count as settled.
const WAIT_FOR_ASSETS: &str = r#"
(async () => {
  if (document.readyState !== 'complete') {
    await new Promise((resolve) => window.addEventListener('load', resolve, { once: true }));
  }
  if (document.fonts && document.fonts.ready) {
    await document.fonts.ready;
  }
  await Promise.all(Array.from(document.images).map((img) => {
    if (img.complete) return Promise.resolve();
    return new Promise((resolve) => {
      img.addEventListener('load', resolve, { once: true });
      img.addEventListener('error', resolve, { once: true });
    });
  }));
  return true;
})()
"#;

const CHROME_ARGS: &[&str] = &[
    "--disable-gpu",
    "--disable-dev-shm-usage",
    "--disable-extensions",
    "--font-render-hinting=none",
    "--hide-scrollbars",
];

/// Launches headless Chromium processes
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
    no_sandbox: bool,
    request_timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(config: &PdfConfig) -> Self {
        Self {
            executable: config.chrome_executable.as_ref().map(PathBuf::from),
            no_sandbox: config.no_sandbox,
            request_timeout: Duration::from_secs(config.load_timeout_secs),
        }
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserHandle>, PdfError> {
        let mut builder = BrowserConfig::builder().request_timeout(self.request_timeout);
        for arg in CHROME_ARGS {
            builder = builder.arg(*arg);
        }
        if self.no_sandbox {
            builder = builder.no_sandbox();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(PdfError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PdfError::Launch(e.to_string()))?;

        // The CDP connection only makes progress while its handler is polled.
        let events = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Chromium event error");
                }
            }
            debug!("Chromium connection closed");
        });

        Ok(Box::new(ChromiumBrowser {
            browser: Mutex::new(browser),
            events,
        }))
    }
}

struct ChromiumBrowser {
    browser: Mutex<Browser>,
    events: JoinHandle<()>,
}

impl ChromiumBrowser {
    async fn open_page(&self) -> Result<Page, PdfError> {
        self.browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| PdfError::Browser(e.to_string()))
    }
}

#[async_trait]
impl BrowserHandle for ChromiumBrowser {
    async fn print_pdf(
        &self,
        html: &str,
        options: &PdfOptions,
        viewport: &Viewport,
    ) -> Result<Vec<u8>, PdfError> {
        let page = self.open_page().await?;
        let result = async {
            load(&page, html, viewport).await?;
            page.pdf(pdf_params(options)).await.map_err(page_error)
        }
        .await;
        close_page(page).await;
        result
    }

    async fn screenshot(
        &self,
        html: &str,
        options: &ScreenshotOptions,
        viewport: &Viewport,
    ) -> Result<Vec<u8>, PdfError> {
        let page = self.open_page().await?;
        let result = async {
            load(&page, html, viewport).await?;
            page.screenshot(screenshot_params(options))
                .await
                .map_err(page_error)
        }
        .await;
        close_page(page).await;
        result
    }

    async fn close(&self) -> Result<(), PdfError> {
        let mut browser = self.browser.lock().await;
        let closed = browser
            .close()
            .await
            .map_err(|e| PdfError::Browser(e.to_string()));
        if closed.is_ok() {
            if let Err(e) = browser.wait().await {
                warn!(error = %e, "Waiting for Chromium exit failed");
            }
        }
        self.events.abort();
        closed.map(|_| ())
    }
}

async fn load(page: &Page, html: &str, viewport: &Viewport) -> Result<(), PdfError> {
    page.execute(SetDeviceMetricsOverrideParams::new(
        i64::from(viewport.width),
        i64::from(viewport.height),
        viewport.device_scale_factor,
        false,
    ))
    .await
    .map_err(page_error)?;

    page.set_content(html).await.map_err(page_error)?;

    let wait = EvaluateParams::builder()
        .expression(WAIT_FOR_ASSETS)
        .await_promise(true)
        .return_by_value(true)
        .build()
        .map_err(PdfError::Page)?;
    page.evaluate_expression(wait).await.map_err(page_error)?;
    Ok(())
}

async fn close_page(page: Page) {
    if let Err(e) = page.close().await {
        warn!(error = %e, "Failed to close page");
    }
}

fn pdf_params(options: &PdfOptions) -> PrintToPdfParams {
    // Paper size is given portrait; `landscape` rotates it.
    let (width, height) = options.format.dimensions_mm();
    PrintToPdfParams {
        landscape: Some(options.orientation == Orientation::Landscape),
        display_header_footer: Some(options.display_header_footer),
        print_background: Some(options.print_background),
        paper_width: Some(mm_to_inches(width)),
        paper_height: Some(mm_to_inches(height)),
        margin_top: Some(mm_to_inches(options.margin.top)),
        margin_bottom: Some(mm_to_inches(options.margin.bottom)),
        margin_left: Some(mm_to_inches(options.margin.left)),
        margin_right: Some(mm_to_inches(options.margin.right)),
        prefer_css_page_size: Some(options.prefer_css_page_size),
        ..Default::default()
    }
}

fn screenshot_params(options: &ScreenshotOptions) -> ScreenshotParams {
    let format = match options.format {
        ImageFormat::Png => CaptureScreenshotFormat::Png,
        ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
    };
    let builder = ScreenshotParams::builder()
        .format(format)
        .full_page(options.full_page);
    match options.quality {
        Some(quality) => builder.quality(i64::from(quality)).build(),
        None => builder.build(),
    }
}

fn page_error(e: chromiumoxide::error::CdpError) -> PdfError {
    PdfError::Page(e.to_string())
}
