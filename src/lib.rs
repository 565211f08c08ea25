//! SiteAudit - a web site security audit API
//!
//! This crate provides a layered architecture for scanning web sites with
//! independent security probes (SSL, ports, headers, CMS, DDoS mitigation),
//! aggregating their outcomes into a composite score and issuing verifiable
//! certificates and reports.

use std::sync::Arc;

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod presentation;

pub use config::Config;
pub use logging::init_tracing;

use application::{DocumentServiceImpl, ScanOrchestratorImpl};
use infrastructure::{FileJobStore, ProbeRegistry};
use presentation::{AppState, create_router};

/// Build the application router from configuration. Shared by the server
/// binary and the integration tests.
pub async fn create_app(
    config: Config,
) -> Result<axum::Router, Box<dyn std::error::Error + Send + Sync>> {
    let store = Arc::new(FileJobStore::new(config.store.directory.clone()));
    let probes = Arc::new(ProbeRegistry::with_defaults(&config.scan)?);

    let orchestrator = Arc::new(ScanOrchestratorImpl::new(
        store.clone(),
        probes,
        &config.scan,
    ));
    let documents = Arc::new(DocumentServiceImpl::new(
        store.clone(),
        config.certificate.signing_secret.clone(),
    ));

    let app_state = AppState {
        orchestrator,
        documents,
        store,
    };

    Ok(create_router(app_state, &config))
}
