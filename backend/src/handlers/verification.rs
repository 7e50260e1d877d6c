//! Public certificate verification

use axum::{
    extract::{Path, State},
    Json,
};

use crate::services::certificate::VerificationResult;
use crate::AppState;

/// Verify a certificate number. Always answers 200; `valid` carries the
/// verdict.
pub async fn verify_certificate(
    State(state): State<AppState>,
    Path(certificate_number): Path<String>,
) -> Json<VerificationResult> {
    Json(state.certificates.verify_certificate(&certificate_number).await)
}
