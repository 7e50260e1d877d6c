//! Route definitions for the certificate API

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{
    handlers,
    middleware::{auth_middleware, require_certificate_admin},
    AppState,
};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Public verification (printed on certificates)
        .route("/verify/:certificate_number", get(handlers::verify_certificate))
        // Protected routes
        .nest("/certificates", certificate_routes(state.clone()))
        .nest("/templates", template_routes(state))
}

/// Certificate routes. Everything except the PDF download is admin-only.
fn certificate_routes(state: AppState) -> Router<AppState> {
    let admin = Router::new()
        .route("/", get(handlers::list_certificates))
        .route("/generate", post(handlers::generate_certificates))
        .route("/stats", get(handlers::get_certificate_stats))
        .route("/:certificate_id", get(handlers::get_certificate))
        .route("/:certificate_id/revoke", post(handlers::revoke_certificate))
        .route_layer(middleware::from_fn(require_certificate_admin));

    Router::new()
        .route("/:certificate_id/pdf", get(handlers::download_certificate_pdf))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Template routes (admin)
fn template_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_templates).post(handlers::create_template))
        .route("/validate", post(handlers::validate_template))
        .route("/preview", post(handlers::preview_template))
        .route(
            "/:template_id",
            get(handlers::get_template).put(handlers::update_template),
        )
        .route("/:template_id/default", post(handlers::set_default_template))
        .route_layer(middleware::from_fn(require_certificate_admin))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
