//! Certificate and report document endpoints

use axum::{
    extract::{Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::presentation::controllers::scan::AppState;
use crate::presentation::models::{CertificateResponse, ReportResponse};

/// Fetch the security certificate for a finished scan.
///
/// Issuance is idempotent: the first call fixes the score snapshot and
/// verification token, later calls return the same document.
#[utoipa::path(
    get,
    path = "/api/certificate/{scan_id}",
    tag = "documents",
    params(
        ("scan_id" = Uuid, Path, description = "Scan job id")
    ),
    responses(
        (status = 200, description = "Certificate payload", body = CertificateResponse),
        (status = 404, description = "Unknown scan id", body = crate::presentation::models::ErrorResponse),
        (status = 409, description = "Scan has not finished yet", body = crate::presentation::models::ErrorResponse)
    )
)]
pub async fn get_certificate(
    State(state): State<AppState>,
    Path(scan_id): Path<Uuid>,
) -> Result<Json<CertificateResponse>, ApplicationError> {
    let payload = state.documents.certificate(scan_id).await?;
    Ok(Json(CertificateResponse::from(payload)))
}

/// Fetch the detailed report for a finished scan
#[utoipa::path(
    get,
    path = "/api/report/{scan_id}",
    tag = "documents",
    params(
        ("scan_id" = Uuid, Path, description = "Scan job id")
    ),
    responses(
        (status = 200, description = "Report payload", body = ReportResponse),
        (status = 404, description = "Unknown scan id", body = crate::presentation::models::ErrorResponse),
        (status = 409, description = "Scan has not finished yet", body = crate::presentation::models::ErrorResponse)
    )
)]
pub async fn get_report(
    State(state): State<AppState>,
    Path(scan_id): Path<Uuid>,
) -> Result<Json<ReportResponse>, ApplicationError> {
    let payload = state.documents.report(scan_id).await?;
    Ok(Json(ReportResponse::from(payload)))
}
