//! Scan submission and polling endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::errors::ApplicationError;
use crate::application::{DocumentService, ScanOrchestrator};
use crate::infrastructure::JobStore;
use crate::presentation::models::{ScanJobResponse, ScanRequest, ScanSubmittedResponse};

/// Application state containing services
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<dyn ScanOrchestrator>,
    pub documents: Arc<dyn DocumentService>,
    pub store: Arc<dyn JobStore>,
}

/// Start a scan of a target URL
#[utoipa::path(
    post,
    path = "/api/scan",
    tag = "scan",
    request_body = ScanRequest,
    responses(
        (status = 202, description = "Scan accepted, probes running in the background", body = ScanSubmittedResponse),
        (status = 400, description = "Invalid target URL, empty or unknown scan types", body = crate::presentation::models::ErrorResponse)
    )
)]
pub async fn submit_scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> Result<(StatusCode, Json<ScanSubmittedResponse>), ApplicationError> {
    let scan_id = state
        .orchestrator
        .submit(&request.url, &request.scan_types, &request.language)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ScanSubmittedResponse {
            scan_id,
            status: "pending".to_string(),
        }),
    ))
}

/// Poll the state of a scan
#[utoipa::path(
    get,
    path = "/api/scan/{scan_id}",
    tag = "scan",
    params(
        ("scan_id" = Uuid, Path, description = "Scan job id")
    ),
    responses(
        (status = 200, description = "Current scan state, with results once terminal", body = ScanJobResponse),
        (status = 404, description = "Unknown scan id", body = crate::presentation::models::ErrorResponse)
    )
)]
pub async fn get_scan(
    State(state): State<AppState>,
    Path(scan_id): Path<Uuid>,
) -> Result<Json<ScanJobResponse>, ApplicationError> {
    let job = state.orchestrator.get_job(scan_id).await?;
    Ok(Json(ScanJobResponse::from(&job)))
}
