//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::{CertificatePayload, ReportPayload};
use crate::domain::{ProbeOutcome, ScanJob, SecurityLevel};

fn default_language() -> String {
    "ru".to_string()
}

/// Request model for starting a scan
#[derive(Debug, Deserialize, ToSchema)]
pub struct ScanRequest {
    /// Absolute URL of the site to scan
    #[schema(example = "https://example.com")]
    pub url: String,

    /// Requested probe categories
    #[schema(example = json!(["ssl", "headers", "ports"]))]
    pub scan_types: Vec<String>,

    /// Language for recommendations and report labels
    #[schema(example = "ru")]
    #[serde(default = "default_language")]
    pub language: String,
}

/// Immediate response to an accepted scan request
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanSubmittedResponse {
    /// Job id for polling scan state and fetching documents
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub scan_id: Uuid,

    /// Always "pending": probes run in the background
    #[schema(example = "pending")]
    pub status: String,
}

/// Current state of a scan job. Score, per-probe results and
/// recommendations are present once the job is terminal.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScanJobResponse {
    pub scan_id: Uuid,
    pub url: String,
    #[schema(example = "completed")]
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Composite security score in [0,100]
    pub score: Option<u8>,
    pub security_level: Option<String>,
    pub results: Option<BTreeMap<String, ProbeOutcomeDto>>,
    pub recommendations: Option<Vec<String>>,
}

impl From<&ScanJob> for ScanJobResponse {
    fn from(job: &ScanJob) -> Self {
        let result = job.result.as_ref();
        Self {
            scan_id: job.id,
            url: job.target.to_string(),
            status: job.state.to_string(),
            created_at: job.created_at,
            finished_at: job.finished_at,
            score: result.map(|r| r.score),
            security_level: result.map(|r| SecurityLevel::from_score(r.score).to_string()),
            results: result.map(|r| {
                r.outcomes
                    .iter()
                    .map(|(kind, outcome)| {
                        (kind.canonical_name().to_string(), ProbeOutcomeDto::from(outcome))
                    })
                    .collect()
            }),
            recommendations: result.map(|r| r.recommendations.clone()),
        }
    }
}

/// One probe's recorded outcome
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeOutcomeDto {
    #[schema(example = "success")]
    pub outcome: String,
    /// Sub-score in [0,100], present for success/partial_success
    pub score: Option<u8>,
    pub findings: Vec<String>,
    pub details: Value,
    /// Error description, present for timeout/failure
    pub error: Option<String>,
}

impl From<&ProbeOutcome> for ProbeOutcomeDto {
    fn from(outcome: &ProbeOutcome) -> Self {
        Self {
            outcome: outcome.outcome.to_string(),
            score: outcome.score,
            findings: outcome.findings.clone(),
            details: outcome.details.clone(),
            error: outcome.error.clone(),
        }
    }
}

/// Certificate document payload for a finished scan
#[derive(Debug, Serialize, ToSchema)]
pub struct CertificateResponse {
    pub scan_id: Uuid,
    pub url: String,
    pub score: u8,
    #[schema(example = "good")]
    pub security_level: String,
    pub issued_at: DateTime<Utc>,
    /// Opaque token allowing third parties to confirm issuance
    pub verification_token: String,
}

impl From<CertificatePayload> for CertificateResponse {
    fn from(payload: CertificatePayload) -> Self {
        Self {
            scan_id: payload.scan_id,
            url: payload.target,
            score: payload.score,
            security_level: payload.security_level.to_string(),
            issued_at: payload.issued_at,
            verification_token: payload.verification_token,
        }
    }
}

/// Detailed report payload for a finished scan
#[derive(Debug, Serialize, ToSchema)]
pub struct ReportResponse {
    pub scan_id: Uuid,
    pub url: String,
    #[schema(example = "ru")]
    pub language: String,
    pub score: u8,
    pub security_level: String,
    pub certificate_eligible: bool,
    pub probes: Vec<ProbeReportDto>,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<ReportPayload> for ReportResponse {
    fn from(payload: ReportPayload) -> Self {
        Self {
            scan_id: payload.scan_id,
            url: payload.target,
            language: payload.language.to_string(),
            score: payload.score,
            security_level: payload.security_level.to_string(),
            certificate_eligible: payload.certificate_eligible,
            probes: payload
                .probes
                .into_iter()
                .map(|section| ProbeReportDto {
                    probe: section.probe.to_string(),
                    label: section.label,
                    outcome: section.outcome.to_string(),
                    score: section.score,
                    findings: section.findings,
                    details: section.details,
                    error: section.error,
                })
                .collect(),
            recommendations: payload.recommendations,
            created_at: payload.created_at,
            finished_at: payload.finished_at,
        }
    }
}

/// One probe's section of the detailed report
#[derive(Debug, Serialize, ToSchema)]
pub struct ProbeReportDto {
    #[schema(example = "ssl")]
    pub probe: String,
    /// Localized probe label
    pub label: String,
    pub outcome: String,
    pub score: Option<u8>,
    pub findings: Vec<String>,
    pub details: Value,
    pub error: Option<String>,
}

/// Aggregate platform statistics derived from the job store
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_scans: u64,
    pub certificates_issued: u64,
    /// Distinct target hosts scanned
    pub active_users: u64,
    pub score_distribution: ScoreDistributionDto,
}

/// Terminal scan counts bucketed by score
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreDistributionDto {
    /// Scans scoring 80-100
    pub high: u64,
    /// Scans scoring 60-79
    pub medium: u64,
    /// Scans scoring 0-59
    pub low: u64,
}

/// Error envelope returned by every failing endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error details
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorDetail {
    #[schema(example = "Scan not found: 550e8400-e29b-41d4-a716-446655440000")]
    pub message: String,
    #[schema(example = "not_found")]
    pub r#type: String,
    #[schema(example = 404)]
    pub status: u16,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "healthy")]
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}
