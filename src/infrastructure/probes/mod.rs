//! Probe adapters: one capability module per scan category

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::ProbeError;
use crate::config::ScanConfig;
use crate::domain::{ProbeKind, ScanTarget};

pub mod cms;
pub mod ddos;
pub mod headers;
pub mod ports;
pub mod ssl;

pub use cms::CmsProbe;
pub use ddos::DdosProbe;
pub use headers::HeadersProbe;
pub use ports::PortProbe;
pub use ssl::SslProbe;

/// Raw result produced by a probe adapter before it is recorded as an outcome
#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub score: u8,
    pub partial: bool,
    pub details: Value,
    pub findings: Vec<String>,
}

impl ProbeReport {
    /// A complete probe result
    pub fn complete(score: u8, details: Value, findings: Vec<String>) -> Self {
        Self {
            score,
            partial: false,
            details,
            findings,
        }
    }

    /// A result where part of the checks could not run but a usable
    /// sub-score was still produced
    pub fn partial(score: u8, details: Value, findings: Vec<String>) -> Self {
        Self {
            score,
            partial: true,
            details,
            findings,
        }
    }
}

/// Uniform capability contract for one probe category.
///
/// Adapters do their own protocol work but the orchestrator does not trust
/// them with time: the per-probe timeout is enforced externally via
/// cancellation, so an adapter that hangs is simply abandoned.
#[async_trait]
pub trait ProbeAdapter: Send + Sync {
    /// The catalog entry this adapter implements
    fn kind(&self) -> ProbeKind;

    /// Run the probe against a validated target
    async fn probe(&self, target: &ScanTarget) -> Result<ProbeReport, ProbeError>;
}

/// Fixed lookup of probe adapters by kind
pub struct ProbeRegistry {
    adapters: HashMap<ProbeKind, Arc<dyn ProbeAdapter>>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registry with all five production adapters wired from configuration
    pub fn with_defaults(config: &ScanConfig) -> Result<Self, ProbeError> {
        // Targets with broken TLS must still be inspectable by the
        // HTTP-level probes; the SSL probe judges certificates itself.
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.probe_timeout_seconds))
            .danger_accept_invalid_certs(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        let connect_timeout = Duration::from_secs(config.connect_timeout_seconds);

        let mut registry = Self::new();
        registry.register(Arc::new(SslProbe::new(connect_timeout)));
        registry.register(Arc::new(PortProbe::new(connect_timeout)));
        registry.register(Arc::new(HeadersProbe::new(client.clone())));
        registry.register(Arc::new(CmsProbe::new(client.clone())));
        registry.register(Arc::new(DdosProbe::new(client)));
        Ok(registry)
    }

    pub fn register(&mut self, adapter: Arc<dyn ProbeAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: ProbeKind) -> Option<Arc<dyn ProbeAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl Default for ProbeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
