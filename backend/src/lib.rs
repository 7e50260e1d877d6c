//! Certificate Platform - Backend
//!
//! Issues course and module certificates from HTML templates, renders them to
//! PDF through a pooled headless browser, and answers public verification
//! requests.

use std::sync::Arc;

use axum::{routing::get, Router};
use shared::TemplateEngine;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod pdf;
pub mod routes;
pub mod services;
pub mod store;

pub use config::Config;

use pdf::{BrowserLauncher, PdfRenderer};
use services::{CertificateService, TemplateService};
use store::CertificateStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn CertificateStore>,
    pub renderer: Arc<PdfRenderer>,
    pub certificates: CertificateService,
    pub templates: TemplateService,
}

impl AppState {
    /// Wire the services around an explicit store and browser launcher
    pub fn new(
        config: Config,
        store: Arc<dyn CertificateStore>,
        launcher: Arc<dyn BrowserLauncher>,
    ) -> Self {
        let engine = Arc::new(TemplateEngine::new(config.certificates.locale));
        let renderer = Arc::new(PdfRenderer::new(launcher, &config.pdf));
        let certificates = CertificateService::new(
            store.clone(),
            engine.clone(),
            renderer.clone(),
            config.certificates.clone(),
        );
        let templates = TemplateService::new(store.clone(), engine, renderer.clone());

        Self {
            config: Arc::new(config),
            store,
            renderer,
            certificates,
            templates,
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .nest("/api/v1", routes::api_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Certificate Platform API v1.0"
}
