//! Health and statistics endpoints

use axum::{extract::State, response::Json};
use chrono::Utc;
use std::collections::HashSet;

use crate::application::errors::ApplicationError;
use crate::presentation::controllers::scan::AppState;
use crate::presentation::models::{HealthResponse, ScoreDistributionDto, StatsResponse};

/// Basic health check endpoint for liveness probes
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health_check(State(_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
    })
}

/// Aggregate platform statistics.
///
/// Derived on demand from the job store rather than kept in a shared
/// counter, so the numbers are always consistent with stored jobs.
#[utoipa::path(
    get,
    path = "/api/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Aggregate statistics", body = StatsResponse)
    )
)]
pub async fn get_stats(
    State(state): State<AppState>,
) -> Result<Json<StatsResponse>, ApplicationError> {
    let summaries = state.store.list().await?;

    let mut hosts: HashSet<String> = HashSet::new();
    let mut certificates_issued = 0u64;
    let mut high = 0u64;
    let mut medium = 0u64;
    let mut low = 0u64;

    for summary in &summaries {
        hosts.insert(summary.host.clone());
        if summary.certificate_issued {
            certificates_issued += 1;
        }
        match summary.score {
            Some(score) if score >= 80 => high += 1,
            Some(score) if score >= 60 => medium += 1,
            Some(_) => low += 1,
            None => {}
        }
    }

    Ok(Json(StatsResponse {
        total_scans: summaries.len() as u64,
        certificates_issued,
        active_users: hosts.len() as u64,
        score_distribution: ScoreDistributionDto { high, medium, low },
    }))
}
