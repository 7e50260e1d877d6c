//! Browser pool and PDF renderer tests, run against an in-process fake browser

mod common;

use std::sync::Arc;
use std::time::Duration;

use certificate_backend::pdf::{
    ImageFormat, PageMargin, PdfError, PdfOptions, ScreenshotOptions,
};
use common::*;
use shared::{Orientation, PaperFormat};

const DOCUMENT: &str = "<!DOCTYPE html><html><body><h1>Certificate</h1></body></html>";
const LANDSCAPE_A4: &str = "/MediaBox [0 0 841.89 595.28]";

fn count(counter: &std::sync::atomic::AtomicUsize) -> usize {
    BrowserStats::get(counter)
}

// ============================================================================
// Pool lifecycle
// ============================================================================

#[tokio::test]
async fn test_browser_is_launched_lazily_and_reused() {
    let launcher = FakeLauncher::new();
    let renderer = renderer(launcher.clone(), 2, Duration::from_secs(5));
    assert_eq!(launcher.launches(), 0);
    assert_eq!(renderer.health().launched, 0);

    for _ in 0..3 {
        renderer
            .generate_pdf(DOCUMENT, &PdfOptions::certificate())
            .await
            .unwrap();
    }

    assert_eq!(launcher.launches(), 1);
    let health = renderer.health();
    assert_eq!(health.size, 2);
    assert_eq!(health.launched, 1);
    assert_eq!(health.idle, 1);
    assert_eq!(health.in_use, 0);
    assert!(!health.closed);
    assert_eq!(count(&launcher.stats.pages_opened), 3);
    assert_eq!(count(&launcher.stats.pages_closed), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_renders_respect_pool_size() {
    let launcher = FakeLauncher::with_delay(Duration::from_millis(40));
    let renderer = Arc::new(renderer(launcher.clone(), 2, Duration::from_secs(5)));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let renderer = renderer.clone();
        handles.push(tokio::spawn(async move {
            renderer
                .generate_pdf(DOCUMENT, &PdfOptions::certificate())
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(launcher.launches() <= 2);
    assert!(count(&launcher.stats.max_active_pages) <= 2);
    assert_eq!(count(&launcher.stats.pages_opened), 8);
    assert_eq!(count(&launcher.stats.active_pages), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_renders_keep_page_geometry() {
    let launcher = FakeLauncher::with_delay(Duration::from_millis(5));
    let renderer = Arc::new(renderer(launcher, 2, Duration::from_secs(5)));

    let mut handles = Vec::new();
    for i in 0..10 {
        let renderer = renderer.clone();
        handles.push(tokio::spawn(async move {
            let html = format!("<!DOCTYPE html><html><body>#{}</body></html>", i);
            renderer
                .generate_pdf(&html, &PdfOptions::certificate())
                .await
                .map(|pdf| (i, pdf))
        }));
    }

    for handle in handles {
        let (i, pdf) = handle.await.unwrap().unwrap();
        assert_eq!(media_box(&pdf).as_deref(), Some(LANDSCAPE_A4));
        assert!(rendered_html(&pdf).contains(&format!("#{}", i)));
    }
}

#[tokio::test]
async fn test_default_options_are_portrait_a4() {
    let renderer = renderer(FakeLauncher::new(), 1, Duration::from_secs(5));
    let pdf = renderer
        .generate_pdf(DOCUMENT, &PdfOptions::default())
        .await
        .unwrap();
    assert_eq!(media_box(&pdf).as_deref(), Some("/MediaBox [0 0 595.28 841.89]"));

    let letter = PdfOptions {
        format: PaperFormat::Letter,
        orientation: Orientation::Landscape,
        ..PdfOptions::default()
    };
    let pdf = renderer.generate_pdf(DOCUMENT, &letter).await.unwrap();
    assert_eq!(media_box(&pdf).as_deref(), Some("/MediaBox [0 0 792.00 612.00]"));
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_page_failure_keeps_browser() {
    let launcher = FakeLauncher::new();
    let renderer = renderer(launcher.clone(), 1, Duration::from_secs(5));

    launcher.set_behaviour(Behaviour::FailPage);
    let err = renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap_err();
    assert!(matches!(err, PdfError::Page(_)));
    assert_eq!(count(&launcher.stats.pages_opened), 1);
    assert_eq!(count(&launcher.stats.pages_closed), 1);

    launcher.set_behaviour(Behaviour::Render);
    renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap();
    assert_eq!(launcher.launches(), 1);
    assert_eq!(count(&launcher.stats.browsers_closed), 0);
}

#[tokio::test]
async fn test_crashed_browser_is_replaced() {
    let launcher = FakeLauncher::new();
    let renderer = renderer(launcher.clone(), 1, Duration::from_secs(5));

    launcher.set_behaviour(Behaviour::Crash);
    let err = renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap_err();
    assert!(matches!(err, PdfError::Browser(_)));
    assert_eq!(count(&launcher.stats.browsers_closed), 1);
    assert_eq!(renderer.health().launched, 0);

    launcher.set_behaviour(Behaviour::Render);
    let pdf = renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap();
    assert!(pdf.starts_with(b"%PDF"));
    assert_eq!(launcher.launches(), 2);
}

#[tokio::test]
async fn test_hung_render_times_out() {
    let launcher = FakeLauncher::new();
    let renderer = renderer(launcher.clone(), 1, Duration::from_millis(100));

    launcher.set_behaviour(Behaviour::Hang);
    let err = renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap_err();
    assert!(matches!(err, PdfError::Timeout(_)));
    assert_eq!(count(&launcher.stats.pages_closed), 1);
    assert_eq!(count(&launcher.stats.browsers_closed), 1);

    launcher.set_behaviour(Behaviour::Render);
    renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_invalid_options_fail_before_launch() {
    let launcher = FakeLauncher::new();
    let renderer = renderer(launcher.clone(), 1, Duration::from_secs(5));

    let negative = PdfOptions {
        margin: PageMargin {
            top: -1.0,
            ..PageMargin::default()
        },
        ..PdfOptions::certificate()
    };
    let err = renderer.generate_pdf(DOCUMENT, &negative).await.unwrap_err();
    assert!(matches!(err, PdfError::InvalidOptions(_)));

    let oversized = PdfOptions {
        margin: PageMargin::uniform(150.0),
        ..PdfOptions::certificate()
    };
    let err = renderer.generate_pdf(DOCUMENT, &oversized).await.unwrap_err();
    assert!(matches!(err, PdfError::InvalidOptions(_)));

    let png_quality = ScreenshotOptions {
        quality: Some(80),
        ..ScreenshotOptions::default()
    };
    let err = renderer
        .generate_screenshot(DOCUMENT, &png_quality)
        .await
        .unwrap_err();
    assert!(matches!(err, PdfError::InvalidOptions(_)));

    assert_eq!(launcher.launches(), 0);
}

// ============================================================================
// Screenshots and shutdown
// ============================================================================

#[tokio::test]
async fn test_screenshot_shares_the_pool() {
    let launcher = FakeLauncher::new();
    let renderer = renderer(launcher.clone(), 1, Duration::from_secs(5));

    let png = renderer
        .generate_screenshot(DOCUMENT, &ScreenshotOptions::default())
        .await
        .unwrap();
    assert!(png.starts_with(b"\x89PNG"));

    let jpeg = ScreenshotOptions {
        format: ImageFormat::Jpeg,
        quality: Some(85),
        ..ScreenshotOptions::default()
    };
    renderer.generate_screenshot(DOCUMENT, &jpeg).await.unwrap();
    renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap();
    assert_eq!(launcher.launches(), 1);
}

#[tokio::test]
async fn test_closed_renderer_rejects_work() {
    let launcher = FakeLauncher::new();
    let renderer = renderer(launcher.clone(), 2, Duration::from_secs(5));
    renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap();

    renderer.close_browser().await;
    assert_eq!(count(&launcher.stats.browsers_closed), 1);
    let health = renderer.health();
    assert!(health.closed);
    assert_eq!(health.launched, 0);

    let err = renderer
        .generate_pdf(DOCUMENT, &PdfOptions::certificate())
        .await
        .unwrap_err();
    assert!(matches!(err, PdfError::PoolClosed));

    // Closing twice is harmless
    renderer.close_browser().await;
    assert_eq!(count(&launcher.stats.browsers_closed), 1);
}
