//! Error handling for the certificate platform
//!
//! Provides consistent error responses in English and Thai

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::TemplateError;
use thiserror::Error;

use crate::pdf::PdfError;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_th: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Certificate lifecycle errors
    #[error("Certificate {0} has no renderable content")]
    MissingContent(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // Rendering errors
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_th: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: impl Into<String>, message_th: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message_en: message_en.into(),
            message_th: message_th.into(),
            field: None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("TOKEN_EXPIRED", "Token has expired", "โทเค็นหมดอายุแล้ว"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token", "โทเค็นไม่ถูกต้อง"),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action",
                    "คุณไม่มีสิทธิ์ในการดำเนินการนี้",
                ),
            ),
            AppError::Validation {
                field,
                message,
                message_th,
            } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_th.clone())
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "VALIDATION_ERROR",
                    msg.clone(),
                    format!("ข้อมูลไม่ถูกต้อง: {}", msg),
                ),
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new(
                        "DUPLICATE_ENTRY",
                        format!("A record with this {} already exists", field),
                        format!("มีข้อมูล {} นี้อยู่แล้ว", field),
                    )
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("ไม่พบ {}", resource),
                ),
            ),
            AppError::MissingContent(certificate) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "MISSING_CONTENT",
                    format!("Certificate {} has no renderable content", certificate),
                    format!("ใบประกาศนียบัตร {} ไม่มีเนื้อหาที่สามารถแสดงผลได้", certificate),
                ),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new(
                    "INVALID_STATE_TRANSITION",
                    msg.clone(),
                    format!("ไม่สามารถเปลี่ยนสถานะได้: {}", msg),
                ),
            ),
            AppError::Template(err) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "TEMPLATE_ERROR",
                    err.to_string(),
                    format!("แม่แบบไม่ถูกต้อง: {}", err),
                ),
            ),
            AppError::Pdf(PdfError::Timeout(_)) => (
                StatusCode::GATEWAY_TIMEOUT,
                ErrorDetail::new(
                    "PDF_TIMEOUT",
                    "PDF rendering timed out",
                    "การสร้างไฟล์ PDF ใช้เวลานานเกินกำหนด",
                ),
            ),
            AppError::Pdf(err) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "PDF_RENDER_ERROR",
                    format!("PDF rendering failed: {}", err),
                    "เกิดข้อผิดพลาดในการสร้างไฟล์ PDF",
                ),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "CONFIGURATION_ERROR",
                    format!("Configuration error: {}", msg),
                    format!("เกิดข้อผิดพลาดในการตั้งค่า: {}", msg),
                ),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "DATABASE_ERROR",
                    "A database error occurred",
                    "เกิดข้อผิดพลาดกับฐานข้อมูล",
                ),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone(), "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์"),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred",
                    "เกิดข้อผิดพลาดภายในเซิร์ฟเวอร์",
                ),
            ),
        };

        // Log the error for debugging
        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for services and handlers
pub type AppResult<T> = Result<T, AppError>;
