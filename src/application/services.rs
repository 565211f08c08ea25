//! Application services orchestrating the scan lifecycle

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout};
use tracing::{info, warn};
use uuid::Uuid;

use super::errors::ApplicationError;
use crate::config::ScanConfig;
use crate::domain::{
    CERTIFICATE_ELIGIBLE_SCORE, Certificate, Locale, OutcomeKind, ProbeKind, ProbeOutcome,
    ScanJob, ScanTarget, ScoringEngine, SecurityLevel,
};
use crate::infrastructure::probes::{ProbeRegistry, ProbeReport};
use crate::infrastructure::store::JobStore;

/// Service owning the scan job state machine and concurrent probe dispatch
#[async_trait]
pub trait ScanOrchestrator: Send + Sync {
    /// Validate and accept a scan request. Returns the job id immediately;
    /// probes run in the background.
    async fn submit(
        &self,
        target: &str,
        scan_types: &[String],
        language: &str,
    ) -> Result<Uuid, ApplicationError>;

    /// Fetch the current state of a job
    async fn get_job(&self, job_id: Uuid) -> Result<ScanJob, ApplicationError>;
}

/// Orchestrator implementation dispatching probes over a shared worker limit
#[derive(Clone)]
pub struct ScanOrchestratorImpl {
    store: Arc<dyn JobStore>,
    probes: Arc<ProbeRegistry>,
    limiter: Arc<Semaphore>,
    probe_timeout: Duration,
    job_deadline: Duration,
}

impl ScanOrchestratorImpl {
    pub fn new(store: Arc<dyn JobStore>, probes: Arc<ProbeRegistry>, config: &ScanConfig) -> Self {
        Self::with_timeouts(
            store,
            probes,
            config.max_concurrent_probes,
            Duration::from_secs(config.probe_timeout_seconds),
            Duration::from_secs(config.job_deadline_seconds),
        )
    }

    pub fn with_timeouts(
        store: Arc<dyn JobStore>,
        probes: Arc<ProbeRegistry>,
        max_concurrent_probes: usize,
        probe_timeout: Duration,
        job_deadline: Duration,
    ) -> Self {
        Self {
            store,
            probes,
            limiter: Arc::new(Semaphore::new(max_concurrent_probes)),
            probe_timeout,
            job_deadline,
        }
    }

    /// Run every requested probe for a job and finalize it exactly once.
    ///
    /// Probe misbehavior never crosses this boundary: adapter errors and
    /// panics become Failure outcomes, elapsed per-probe timeouts become
    /// Timeout outcomes, and anything still outstanding when the job deadline
    /// fires is abandoned and force-recorded as Timeout.
    async fn run_scan(&self, mut job: ScanJob) {
        job.start();
        if let Err(e) = self.store.put(&job).await {
            warn!(job_id = %job.id, error = %e, "failed to persist running state, continuing scan");
        }

        let deadline = Instant::now() + self.job_deadline;
        let mut outcomes: BTreeMap<ProbeKind, ProbeOutcome> = BTreeMap::new();
        let mut join_set: JoinSet<(ProbeKind, ProbeOutcome)> = JoinSet::new();

        for kind in job.requested.clone() {
            let Some(adapter) = self.probes.get(kind) else {
                outcomes.insert(
                    kind,
                    ProbeOutcome::failure(kind, format!("no adapter registered for '{}'", kind)),
                );
                continue;
            };

            let target = job.target.clone();
            let limiter = self.limiter.clone();
            let probe_timeout = self.probe_timeout;

            join_set.spawn(async move {
                let _permit = limiter.acquire_owned().await.ok();

                // The adapter runs in its own task so a panic inside it is
                // observed as a JoinError here instead of taking down the
                // dispatch loop or sibling probes.
                let mut work = tokio::spawn(async move { adapter.probe(&target).await });

                let outcome = match timeout(probe_timeout, &mut work).await {
                    Ok(Ok(Ok(report))) => outcome_from_report(kind, report),
                    Ok(Ok(Err(probe_error))) => {
                        ProbeOutcome::failure(kind, probe_error.to_string())
                    }
                    Ok(Err(join_error)) => {
                        ProbeOutcome::failure(kind, format!("probe crashed: {}", join_error))
                    }
                    Err(_) => {
                        work.abort();
                        ProbeOutcome::timeout(
                            kind,
                            format!("probe exceeded its {}s limit", probe_timeout.as_secs()),
                        )
                    }
                };

                (kind, outcome)
            });
        }

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, join_set.join_next()).await {
                Ok(Some(Ok((kind, outcome)))) => {
                    // Each probe kind reports at most once by construction
                    outcomes.entry(kind).or_insert(outcome);
                }
                Ok(Some(Err(join_error))) => {
                    warn!(job_id = %job.id, error = %join_error, "probe dispatch task failed");
                }
                Ok(None) => break,
                Err(_) => {
                    warn!(job_id = %job.id, "job deadline elapsed, abandoning outstanding probes");
                    join_set.abort_all();
                    break;
                }
            }
        }

        for kind in &job.requested {
            if !outcomes.contains_key(kind) {
                outcomes.insert(
                    *kind,
                    ProbeOutcome::timeout(*kind, "job deadline elapsed before this probe reported"),
                );
            }
        }

        let state = ScoringEngine::terminal_state(&outcomes);
        let result = ScoringEngine::evaluate(job.id, outcomes, job.locale);
        let score = result.score;
        job.finish(result, state);

        if let Err(e) = self.store.put(&job).await {
            tracing::error!(job_id = %job.id, error = %e, "failed to persist terminal scan state");
            return;
        }

        info!(job_id = %job.id, score, state = %job.state, "scan finalized");
    }
}

#[async_trait]
impl ScanOrchestrator for ScanOrchestratorImpl {
    async fn submit(
        &self,
        target: &str,
        scan_types: &[String],
        language: &str,
    ) -> Result<Uuid, ApplicationError> {
        let target = ScanTarget::parse(target)?;

        let mut kinds = Vec::with_capacity(scan_types.len());
        for raw in scan_types {
            let kind = raw
                .parse::<ProbeKind>()
                .map_err(|_| ApplicationError::UnknownProbeType { name: raw.clone() })?;
            kinds.push(kind);
        }

        let job = ScanJob::new(target, &kinds, Locale::from_tag(language))?;
        self.store.put(&job).await?;

        info!(
            job_id = %job.id,
            target = %job.target,
            probes = ?job.requested,
            locale = %job.locale,
            "scan accepted"
        );

        let job_id = job.id;
        let runner = self.clone();
        tokio::spawn(async move { runner.run_scan(job).await });

        Ok(job_id)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<ScanJob, ApplicationError> {
        self.store
            .get(job_id)
            .await?
            .ok_or(ApplicationError::NotFound { id: job_id })
    }
}

fn outcome_from_report(kind: ProbeKind, report: ProbeReport) -> ProbeOutcome {
    if report.partial {
        ProbeOutcome::partial_success(kind, report.score, report.details, report.findings)
    } else {
        ProbeOutcome::success(kind, report.score, report.details, report.findings)
    }
}

/// Renderer-facing certificate payload. An external document renderer turns
/// this into the downloadable certificate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificatePayload {
    pub scan_id: Uuid,
    pub target: String,
    pub score: u8,
    pub security_level: SecurityLevel,
    pub issued_at: DateTime<Utc>,
    pub verification_token: String,
}

/// Renderer-facing report payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportPayload {
    pub scan_id: Uuid,
    pub target: String,
    pub language: Locale,
    pub score: u8,
    pub security_level: SecurityLevel,
    pub certificate_eligible: bool,
    pub probes: Vec<ProbeSection>,
    pub recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// One probe's section of the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSection {
    pub probe: ProbeKind,
    pub label: String,
    pub outcome: OutcomeKind,
    pub score: Option<u8>,
    pub findings: Vec<String>,
    pub details: Value,
    pub error: Option<String>,
}

/// Service building certificate and report payloads for finished scans
#[async_trait]
pub trait DocumentService: Send + Sync {
    async fn certificate(&self, job_id: Uuid) -> Result<CertificatePayload, ApplicationError>;
    async fn report(&self, job_id: Uuid) -> Result<ReportPayload, ApplicationError>;
}

/// Document service backed by the job store.
///
/// Certificates are issuable for every terminal job, including Failed ones:
/// the certificate snapshots the frozen score (0 for Failed jobs) and its
/// token attests issuance, not quality.
pub struct DocumentServiceImpl {
    store: Arc<dyn JobStore>,
    signing_secret: String,
    issue_lock: Mutex<()>,
}

impl DocumentServiceImpl {
    pub fn new(store: Arc<dyn JobStore>, signing_secret: String) -> Self {
        Self {
            store,
            signing_secret,
            issue_lock: Mutex::new(()),
        }
    }

    async fn load_terminal(&self, job_id: Uuid) -> Result<ScanJob, ApplicationError> {
        let job = self
            .store
            .get(job_id)
            .await?
            .ok_or(ApplicationError::NotFound { id: job_id })?;
        if !job.is_terminal() {
            return Err(ApplicationError::NotTerminal { id: job_id });
        }
        Ok(job)
    }

    fn certificate_payload(job: &ScanJob, certificate: &Certificate) -> CertificatePayload {
        CertificatePayload {
            scan_id: job.id,
            target: job.target.to_string(),
            score: certificate.score,
            security_level: SecurityLevel::from_score(certificate.score),
            issued_at: certificate.issued_at,
            verification_token: certificate.token.clone(),
        }
    }
}

#[async_trait]
impl DocumentService for DocumentServiceImpl {
    async fn certificate(&self, job_id: Uuid) -> Result<CertificatePayload, ApplicationError> {
        let job = self.load_terminal(job_id).await?;
        if let Some(certificate) = &job.certificate {
            return Ok(Self::certificate_payload(&job, certificate));
        }

        // First issuance: serialize the read-modify-write so concurrent
        // callers cannot mint two different tokens for the same job.
        let _guard = self.issue_lock.lock().await;
        let mut job = self.load_terminal(job_id).await?;

        let certificate = match job.certificate.clone() {
            Some(existing) => existing,
            None => {
                let score = job.result.as_ref().map(|r| r.score).unwrap_or(0);
                let certificate =
                    Certificate::issue(job.id, score, Utc::now(), &self.signing_secret);
                job.certificate = Some(certificate.clone());
                self.store.put(&job).await?;
                info!(job_id = %job.id, score, "certificate issued");
                certificate
            }
        };

        Ok(Self::certificate_payload(&job, &certificate))
    }

    async fn report(&self, job_id: Uuid) -> Result<ReportPayload, ApplicationError> {
        let job = self.load_terminal(job_id).await?;

        let score = job.result.as_ref().map(|r| r.score).unwrap_or(0);
        let recommendations = job
            .result
            .as_ref()
            .map(|r| r.recommendations.clone())
            .unwrap_or_default();

        let probes = job
            .result
            .as_ref()
            .map(|result| {
                result
                    .outcomes
                    .values()
                    .map(|outcome| ProbeSection {
                        probe: outcome.probe,
                        label: job.locale.probe_label(outcome.probe).to_string(),
                        outcome: outcome.outcome,
                        score: outcome.score,
                        findings: outcome.findings.clone(),
                        details: outcome.details.clone(),
                        error: outcome.error.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ReportPayload {
            scan_id: job.id,
            target: job.target.to_string(),
            language: job.locale,
            score,
            security_level: SecurityLevel::from_score(score),
            certificate_eligible: score >= CERTIFICATE_ELIGIBLE_SCORE,
            probes,
            recommendations,
            created_at: job.created_at,
            finished_at: job.finished_at,
        })
    }
}
