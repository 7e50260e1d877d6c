//! HTTP handlers for certificate template endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use shared::CertificateTemplate;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::template::{
    AnalyzeTemplateInput, CreateTemplateInput, PreviewTemplateInput, TemplateAnalysis,
    TemplatePreview, UpdateTemplateInput,
};
use crate::AppState;

/// Query parameters for listing templates
#[derive(Debug, Deserialize)]
pub struct ListTemplatesQuery {
    pub active_only: Option<bool>,
}

/// List templates, default first
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> AppResult<Json<Vec<CertificateTemplate>>> {
    let templates = state
        .templates
        .list_templates(query.active_only.unwrap_or(false))
        .await?;
    Ok(Json(templates))
}

/// Create a template
pub async fn create_template(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTemplateInput>,
) -> AppResult<Json<CertificateTemplate>> {
    let template = state
        .templates
        .create_template(input, current_user.0.user_id)
        .await?;
    Ok(Json(template))
}

/// Get a template by ID
pub async fn get_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
) -> AppResult<Json<CertificateTemplate>> {
    Ok(Json(state.templates.get_template(template_id).await?))
}

/// Update a template
pub async fn update_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
    Json(input): Json<UpdateTemplateInput>,
) -> AppResult<Json<CertificateTemplate>> {
    Ok(Json(state.templates.update_template(template_id, input).await?))
}

/// Make a template the default
pub async fn set_default_template(
    State(state): State<AppState>,
    Path(template_id): Path<i64>,
) -> AppResult<Json<CertificateTemplate>> {
    Ok(Json(state.templates.set_default_template(template_id).await?))
}

/// Check template syntax and list its variables
pub async fn validate_template(
    State(state): State<AppState>,
    Json(input): Json<AnalyzeTemplateInput>,
) -> Json<TemplateAnalysis> {
    Json(state.templates.analyze(&input.html_content))
}

/// Render a template with sample data
pub async fn preview_template(
    State(state): State<AppState>,
    Json(input): Json<PreviewTemplateInput>,
) -> AppResult<Json<TemplatePreview>> {
    Ok(Json(state.templates.preview(input).await?))
}
