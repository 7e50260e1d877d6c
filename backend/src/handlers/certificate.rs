//! HTTP handlers for certificate management endpoints

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{Certificate, CertificateStats, CertificateStatus, CertificateType, DateRange, Pagination};

use crate::error::{AppError, AppResult};
use crate::middleware::CurrentUser;
use crate::services::certificate::{GenerateCertificatesInput, GenerationResult};
use crate::store::CertificateFilter;
use crate::AppState;

/// Largest page a single list request may ask for
const MAX_PAGE_SIZE: i64 = 1000;

// ============================================================================
// Issuance
// ============================================================================

/// Issue certificates for a batch of students
pub async fn generate_certificates(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<GenerateCertificatesInput>,
) -> AppResult<Json<GenerationResult>> {
    let result = state
        .certificates
        .generate_certificates(input, current_user.0.user_id)
        .await?;
    Ok(Json(result))
}

// ============================================================================
// Queries
// ============================================================================

/// Query parameters for listing certificates
#[derive(Debug, Deserialize)]
pub struct ListCertificatesQuery {
    pub user_id: Option<i64>,
    pub course_id: Option<i64>,
    pub certificate_type: Option<CertificateType>,
    pub status: Option<CertificateStatus>,
    pub issued_from: Option<NaiveDate>,
    pub issued_to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub format: Option<String>, // "json" or "csv"
}

impl ListCertificatesQuery {
    fn filter(&self) -> CertificateFilter {
        let defaults = Pagination::default();
        CertificateFilter {
            user_id: self.user_id,
            course_id: self.course_id,
            certificate_type: self.certificate_type,
            status: self.status,
            issued: DateRange {
                start: self.issued_from,
                end: self.issued_to,
            },
            page: Pagination {
                limit: self.limit.unwrap_or(defaults.limit).clamp(1, MAX_PAGE_SIZE),
                offset: self.offset.unwrap_or(defaults.offset).max(0),
            },
        }
    }
}

/// List certificates, as JSON or as a CSV download. CSV exports every
/// matching row; `limit` and `offset` only page the JSON listing.
pub async fn list_certificates(
    State(state): State<AppState>,
    Query(query): Query<ListCertificatesQuery>,
) -> AppResult<Response> {
    let filter = query.filter();

    if query.format.as_deref() == Some("csv") {
        let csv = state.certificates.export_csv(&filter).await?;
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"certificates.csv\""),
            ],
            csv,
        )
            .into_response())
    } else {
        let certificates = state.certificates.list_certificates(&filter).await?;
        Ok(Json(certificates).into_response())
    }
}

/// Certificate counters for the dashboard
pub async fn get_certificate_stats(
    State(state): State<AppState>,
) -> AppResult<Json<CertificateStats>> {
    Ok(Json(state.certificates.get_stats().await?))
}

/// Get a certificate by ID
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(certificate_id): Path<i64>,
) -> AppResult<Json<Certificate>> {
    Ok(Json(state.certificates.get_certificate(certificate_id).await?))
}

/// Download a certificate as PDF. Students may only fetch their own.
pub async fn download_certificate_pdf(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(certificate_id): Path<i64>,
) -> AppResult<Response> {
    let certificate = state.certificates.get_certificate(certificate_id).await?;
    if !current_user.0.can_access_certificate_of(certificate.user_id) {
        return Err(AppError::InsufficientPermissions);
    }

    let pdf = state.certificates.generate_pdf(certificate_id).await?;
    let disposition = format!(
        "attachment; filename=\"certificate-{}.pdf\"",
        certificate.certificate_number
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

// ============================================================================
// Revocation
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RevokeCertificateInput {
    pub reason: String,
}

/// Revoke a certificate
pub async fn revoke_certificate(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(certificate_id): Path<i64>,
    Json(input): Json<RevokeCertificateInput>,
) -> AppResult<Json<Certificate>> {
    let certificate = state
        .certificates
        .revoke_certificate(certificate_id, current_user.0.user_id, &input.reason)
        .await?;
    Ok(Json(certificate))
}
