//! Domain entities representing core business concepts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

use super::errors::DomainError;
use super::value_objects::{Locale, ProbeKind, ScanTarget};

/// Maximum string length kept in sanitized probe details
const DETAIL_STRING_LIMIT: usize = 256;
/// Maximum number of elements kept per array or object in probe details
const DETAIL_COLLECTION_LIMIT: usize = 32;
/// Maximum nesting depth kept in probe details
const DETAIL_DEPTH_LIMIT: usize = 4;

/// Lifecycle state of a scan job.
///
/// `Completed`, `PartialFailure` and `Failed` are terminal; no transition
/// ever leaves a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    PartialFailure,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::PartialFailure | JobState::Failed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::PartialFailure => "partial_failure",
            JobState::Failed => "failed",
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a single probe concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    PartialSuccess,
    Timeout,
    Failure,
}

impl OutcomeKind {
    /// Whether this outcome carries a sub-score usable for aggregation
    pub fn is_usable(&self) -> bool {
        matches!(self, OutcomeKind::Success | OutcomeKind::PartialSuccess)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeKind::Success => "success",
            OutcomeKind::PartialSuccess => "partial_success",
            OutcomeKind::Timeout => "timeout",
            OutcomeKind::Failure => "failure",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Recorded result of one probe for one job.
///
/// Constructors enforce the shape invariants: a sub-score is present exactly
/// for Success/PartialSuccess, an error description exactly for
/// Timeout/Failure, and details are always renderer-safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub probe: ProbeKind,
    pub outcome: OutcomeKind,
    pub score: Option<u8>,
    pub details: Value,
    pub findings: Vec<String>,
    pub error: Option<String>,
}

impl ProbeOutcome {
    pub fn success(probe: ProbeKind, score: u8, details: Value, findings: Vec<String>) -> Self {
        Self {
            probe,
            outcome: OutcomeKind::Success,
            score: Some(score.min(100)),
            details: sanitize_details(&details),
            findings,
            error: None,
        }
    }

    pub fn partial_success(
        probe: ProbeKind,
        score: u8,
        details: Value,
        findings: Vec<String>,
    ) -> Self {
        Self {
            probe,
            outcome: OutcomeKind::PartialSuccess,
            score: Some(score.min(100)),
            details: sanitize_details(&details),
            findings,
            error: None,
        }
    }

    pub fn timeout(probe: ProbeKind, error: impl Into<String>) -> Self {
        Self {
            probe,
            outcome: OutcomeKind::Timeout,
            score: None,
            details: Value::Null,
            findings: Vec::new(),
            error: Some(sanitize_string(&error.into())),
        }
    }

    pub fn failure(probe: ProbeKind, error: impl Into<String>) -> Self {
        Self {
            probe,
            outcome: OutcomeKind::Failure,
            score: None,
            details: Value::Null,
            findings: Vec::new(),
            error: Some(sanitize_string(&error.into())),
        }
    }

    pub fn has_usable_score(&self) -> bool {
        self.outcome.is_usable() && self.score.is_some()
    }
}

/// Strip control characters and bound the length of a rendered string
fn sanitize_string(input: &str) -> String {
    let cleaned: String = input.chars().filter(|c| !c.is_control()).collect();
    if cleaned.chars().count() > DETAIL_STRING_LIMIT {
        cleaned.chars().take(DETAIL_STRING_LIMIT).collect()
    } else {
        cleaned
    }
}

/// Make a probe's free-form details safe for downstream renderers: control
/// characters stripped, strings and collections bounded, nesting capped.
pub fn sanitize_details(value: &Value) -> Value {
    sanitize_value(value, 0)
}

fn sanitize_value(value: &Value, depth: usize) -> Value {
    if depth >= DETAIL_DEPTH_LIMIT {
        return Value::Null;
    }
    match value {
        Value::String(s) => Value::String(sanitize_string(s)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .take(DETAIL_COLLECTION_LIMIT)
                .map(|item| sanitize_value(item, depth + 1))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .take(DETAIL_COLLECTION_LIMIT)
                .map(|(key, item)| (sanitize_string(key), sanitize_value(item, depth + 1)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// The frozen aggregate produced by the scoring engine when a job finalizes.
///
/// Created exactly once per job and never mutated afterwards. Outcomes are
/// keyed by probe kind, so iteration order is the catalog declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositeResult {
    pub job_id: Uuid,
    pub score: u8,
    pub recommendations: Vec<String>,
    pub outcomes: BTreeMap<ProbeKind, ProbeOutcome>,
}

/// A verifiable certificate snapshot for a finished scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub job_id: Uuid,
    pub issued_at: DateTime<Utc>,
    pub score: u8,
    pub token: String,
}

impl Certificate {
    /// Issue a certificate for a finished job. The token is derived
    /// deterministically, so a third party holding the signing secret can
    /// re-derive and confirm it without re-running the scan.
    pub fn issue(job_id: Uuid, score: u8, issued_at: DateTime<Utc>, secret: &str) -> Self {
        let token = Self::derive_token(job_id, issued_at, secret);
        Self {
            job_id,
            issued_at,
            score,
            token,
        }
    }

    /// Recompute the verification token for a job id and issuance timestamp
    pub fn derive_token(job_id: Uuid, issued_at: DateTime<Utc>, secret: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(job_id.as_bytes());
        hasher.update(issued_at.timestamp_millis().to_be_bytes());
        hasher.update(secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Check that this certificate was issued with the given secret
    pub fn verify(&self, secret: &str) -> bool {
        self.token == Self::derive_token(self.job_id, self.issued_at, secret)
    }
}

/// A scan job: one target, one requested probe set, one lifecycle.
///
/// Exclusively owned by the orchestrator while running; immutable once a
/// terminal state is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanJob {
    pub id: Uuid,
    pub target: ScanTarget,
    pub requested: Vec<ProbeKind>,
    pub locale: Locale,
    pub state: JobState,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result: Option<CompositeResult>,
    pub certificate: Option<Certificate>,
}

impl ScanJob {
    /// Create a new pending job. Duplicate probe kinds are collapsed and the
    /// requested set is stored in catalog declaration order.
    pub fn new(
        target: ScanTarget,
        requested: &[ProbeKind],
        locale: Locale,
    ) -> Result<Self, DomainError> {
        if requested.is_empty() {
            return Err(DomainError::EmptyProbeSet);
        }

        let requested: BTreeSet<ProbeKind> = requested.iter().copied().collect();

        Ok(Self {
            id: Uuid::new_v4(),
            target,
            requested: requested.into_iter().collect(),
            locale,
            state: JobState::Pending,
            created_at: Utc::now(),
            finished_at: None,
            result: None,
            certificate: None,
        })
    }

    /// Mark the job as dispatched
    pub fn start(&mut self) {
        if self.state == JobState::Pending {
            self.state = JobState::Running;
        }
    }

    /// Transition to a terminal state with the frozen composite result.
    /// A job that is already terminal is left untouched.
    pub fn finish(&mut self, result: CompositeResult, state: JobState) {
        debug_assert!(state.is_terminal(), "finish requires a terminal state");
        if self.state.is_terminal() {
            return;
        }
        self.state = state;
        self.finished_at = Some(Utc::now());
        self.result = Some(result);
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Condensed view used by listings and the statistics endpoint
    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            host: self.target.host().to_string(),
            state: self.state,
            score: self.result.as_ref().map(|r| r.score),
            certificate_issued: self.certificate.is_some(),
            created_at: self.created_at,
        }
    }
}

/// Condensed job view for listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    pub id: Uuid,
    pub host: String,
    pub state: JobState,
    pub score: Option<u8>,
    pub certificate_issued: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target() -> ScanTarget {
        ScanTarget::parse("https://example.com").unwrap()
    }

    #[test]
    fn test_outcome_constructors_enforce_shape() {
        let ok = ProbeOutcome::success(ProbeKind::Ssl, 90, json!({"https": true}), vec![]);
        assert_eq!(ok.outcome, OutcomeKind::Success);
        assert_eq!(ok.score, Some(90));
        assert!(ok.error.is_none());
        assert!(ok.has_usable_score());

        let timed_out = ProbeOutcome::timeout(ProbeKind::Headers, "exceeded 15s limit");
        assert_eq!(timed_out.outcome, OutcomeKind::Timeout);
        assert!(timed_out.score.is_none());
        assert!(timed_out.error.is_some());
        assert!(!timed_out.has_usable_score());

        let failed = ProbeOutcome::failure(ProbeKind::Cms, "connection refused");
        assert_eq!(failed.outcome, OutcomeKind::Failure);
        assert!(failed.score.is_none());
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_outcome_score_is_clamped() {
        let outcome = ProbeOutcome::success(ProbeKind::Ports, 250, Value::Null, vec![]);
        assert_eq!(outcome.score, Some(100));
    }

    #[test]
    fn test_sanitize_strips_control_characters_and_bounds_size() {
        let dirty = json!({
            "note": "line\u{0000}one\u{001b}[31m",
            "long": "x".repeat(1000),
            "nested": {"a": {"b": {"c": {"d": "too deep"}}}}
        });
        let clean = sanitize_details(&dirty);

        assert_eq!(clean["note"], "lineone[31m");
        assert_eq!(clean["long"].as_str().unwrap().len(), 256);
        // Depth past the cap collapses to null
        assert!(clean["nested"]["a"]["b"]["c"].is_null());
    }

    #[test]
    fn test_certificate_token_is_deterministic() {
        let job_id = Uuid::new_v4();
        let issued_at = Utc::now();
        let cert = Certificate::issue(job_id, 85, issued_at, "secret");
        let again = Certificate::issue(job_id, 85, issued_at, "secret");

        assert_eq!(cert.token, again.token);
        assert!(cert.verify("secret"));
        assert!(!cert.verify("other-secret"));
    }

    #[test]
    fn test_job_dedups_and_orders_requested_probes() {
        let job = ScanJob::new(
            target(),
            &[
                ProbeKind::Headers,
                ProbeKind::Ssl,
                ProbeKind::Headers,
                ProbeKind::Ssl,
            ],
            Locale::Ru,
        )
        .unwrap();
        assert_eq!(job.requested, vec![ProbeKind::Ssl, ProbeKind::Headers]);
        assert_eq!(job.state, JobState::Pending);
    }

    #[test]
    fn test_job_rejects_empty_probe_set() {
        assert!(matches!(
            ScanJob::new(target(), &[], Locale::Ru),
            Err(DomainError::EmptyProbeSet)
        ));
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut job = ScanJob::new(target(), &[ProbeKind::Ssl], Locale::Ru).unwrap();
        job.start();

        let result = CompositeResult {
            job_id: job.id,
            score: 80,
            recommendations: vec![],
            outcomes: BTreeMap::new(),
        };
        job.finish(result.clone(), JobState::Completed);
        assert_eq!(job.state, JobState::Completed);
        assert!(job.finished_at.is_some());

        // A second finish must not rewrite the terminal state
        let mut second = result;
        second.score = 0;
        job.finish(second, JobState::Failed);
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.result.as_ref().unwrap().score, 80);
    }
}
