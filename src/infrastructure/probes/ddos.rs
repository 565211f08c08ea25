//! DDoS-mitigation detection probe

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashSet;
use std::net::IpAddr;
use tokio::net::lookup_host;
use tracing::debug;

use super::{ProbeAdapter, ProbeReport};
use crate::application::errors::ProbeError;
use crate::domain::{ProbeKind, ScanTarget};

/// Response headers whose presence identifies a CDN / mitigation provider
const CDN_HEADERS: &[(&str, &str)] = &[
    ("cf-ray", "Cloudflare"),
    ("cf-cache-status", "Cloudflare"),
    ("x-amz-cf-id", "CloudFront"),
    ("x-served-by", "Fastly"),
    ("x-akamai-transformed", "Akamai"),
    ("x-sucuri-id", "Sucuri"),
    ("x-cdn", "generic"),
];

/// `Server` header values that identify a CDN
const CDN_SERVER_VALUES: &[(&str, &str)] = &[
    ("cloudflare", "Cloudflare"),
    ("cloudfront", "CloudFront"),
    ("akamai", "Akamai"),
    ("fastly", "Fastly"),
    ("sucuri", "Sucuri"),
];

/// Headers that indicate request rate limiting is configured
const RATE_LIMIT_HEADERS: &[&str] = &["x-ratelimit-limit", "ratelimit-limit", "retry-after"];

const CDN_POINTS: u8 = 50;
const RATE_LIMIT_POINTS: u8 = 20;
const MULTI_ORIGIN_POINTS: u8 = 30;

/// Detects CDN fronting, rate limiting, and origin IP diversity
pub struct DdosProbe {
    client: reqwest::Client,
}

impl DdosProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProbeAdapter for DdosProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Ddos
    }

    async fn probe(&self, target: &ScanTarget) -> Result<ProbeReport, ProbeError> {
        debug!(target = %target, "checking DDoS mitigation signals");
        let response = self.client.get(target.as_str()).send().await?;
        let headers = response.headers();

        let mut provider: Option<&str> = None;
        for (name, cdn) in CDN_HEADERS {
            if headers.contains_key(*name) {
                provider = Some(*cdn);
                break;
            }
        }
        if provider.is_none() {
            if let Some(server) = headers.get("server").and_then(|v| v.to_str().ok()) {
                let server = server.to_lowercase();
                provider = CDN_SERVER_VALUES
                    .iter()
                    .find(|(marker, _)| server.contains(marker))
                    .map(|(_, cdn)| *cdn);
            }
        }

        let rate_limited = RATE_LIMIT_HEADERS
            .iter()
            .any(|name| headers.contains_key(*name));

        let addresses: HashSet<IpAddr> =
            lookup_host((target.host(), target.port_or_default()))
                .await
                .map(|addrs| addrs.map(|a| a.ip()).collect())
                .unwrap_or_default();

        let mut score: u8 = 0;
        let mut findings = Vec::new();

        if provider.is_some() {
            score += CDN_POINTS;
        } else {
            findings.push("no_cdn".to_string());
        }
        if rate_limited {
            score += RATE_LIMIT_POINTS;
        } else {
            findings.push("no_rate_limiting".to_string());
        }
        if addresses.len() > 1 {
            score += MULTI_ORIGIN_POINTS;
        } else {
            findings.push("single_origin_ip".to_string());
        }

        let details = json!({
            "cdn": { "detected": provider.is_some(), "provider": provider },
            "rate_limiting": rate_limited,
            "origin_addresses": addresses.len(),
        });

        Ok(ProbeReport::complete(score, details, findings))
    }
}
