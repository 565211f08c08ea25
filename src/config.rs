//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub scan: ScanConfig,
    pub certificate: CertificateConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether to expose interactive API docs (Swagger UI). Should be false in hardened production.
    pub enable_docs: bool,
    /// Global request timeout in seconds applied at the HTTP layer.
    pub request_timeout_seconds: u64,
    /// Allowed CORS origins. Use ["*"] to allow any (development only).
    pub allowed_origins: Vec<String>,
}

/// Job store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub directory: PathBuf,
}

/// Scan orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Per-probe timeout. A probe exceeding it is cancelled and recorded as
    /// a timeout without delaying its siblings.
    pub probe_timeout_seconds: u64,
    /// Overall job deadline covering the slowest plausible probe combination.
    pub job_deadline_seconds: u64,
    /// Global cap on concurrently running probes across all jobs.
    pub max_concurrent_probes: usize,
    /// Timeout for individual TCP/TLS connection attempts inside probes.
    pub connect_timeout_seconds: u64,
    /// User-Agent sent by HTTP-level probes.
    pub user_agent: String,
}

/// Certificate issuance configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateConfig {
    /// Process-wide secret mixed into verification tokens.
    pub signing_secret: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                enable_docs: true,
                request_timeout_seconds: 30,
                allowed_origins: vec!["*".to_string()],
            },
            store: StoreConfig {
                directory: PathBuf::from(".siteaudit_jobs"),
            },
            scan: ScanConfig {
                probe_timeout_seconds: 15,
                job_deadline_seconds: 90,
                max_concurrent_probes: 16,
                connect_timeout_seconds: 5,
                user_agent: format!("SiteAudit/{}", env!("CARGO_PKG_VERSION")),
            },
            certificate: CertificateConfig {
                // Development fallback; deployments override via
                // SITEAUDIT__CERTIFICATE__SIGNING_SECRET
                signing_secret: "siteaudit-dev-secret".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("SITEAUDIT").separator("__"));

        // Override with environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder.build()?.try_deserialize()
    }
}
