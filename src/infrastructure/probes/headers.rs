//! Security header inspection probe

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{ProbeAdapter, ProbeReport};
use crate::application::errors::ProbeError;
use crate::domain::{ProbeKind, ScanTarget};

/// Security headers checked by the probe: header name, finding code when
/// absent, and the score deduction its absence costs.
const SECURITY_HEADERS: &[(&str, &str, u8)] = &[
    ("strict-transport-security", "hsts_missing", 20),
    ("content-security-policy", "csp_missing", 20),
    ("x-frame-options", "x_frame_options_missing", 15),
    ("x-content-type-options", "x_content_type_options_missing", 10),
    ("referrer-policy", "referrer_policy_missing", 5),
];

/// Headers that leak server implementation details
const DISCLOSURE_HEADERS: &[&str] = &["server", "x-powered-by", "x-aspnet-version"];

const DISCLOSURE_DEDUCTION: u8 = 5;

/// Inspects the response headers of the target's landing page
pub struct HeadersProbe {
    client: reqwest::Client,
}

impl HeadersProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProbeAdapter for HeadersProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Headers
    }

    async fn probe(&self, target: &ScanTarget) -> Result<ProbeReport, ProbeError> {
        debug!(target = %target, "inspecting security headers");
        let response = self.client.get(target.as_str()).send().await?;
        let headers = response.headers();

        let mut score: u8 = 100;
        let mut findings = Vec::new();
        let mut present = Vec::new();
        let mut missing = Vec::new();

        for (name, code, deduction) in SECURITY_HEADERS {
            if headers.contains_key(*name) {
                present.push(*name);
            } else {
                missing.push(*name);
                findings.push(code.to_string());
                score = score.saturating_sub(*deduction);
            }
        }

        let mut disclosed = serde_json::Map::new();
        for name in DISCLOSURE_HEADERS {
            if let Some(value) = headers.get(*name) {
                let value = value.to_str().unwrap_or("[non-ascii]").to_string();
                disclosed.insert(name.to_string(), json!(value));
            }
        }
        if !disclosed.is_empty() {
            findings.push("server_header_disclosed".to_string());
            score = score.saturating_sub(DISCLOSURE_DEDUCTION);
        }

        let details = json!({
            "status": response.status().as_u16(),
            "present": present,
            "missing": missing,
            "disclosed": disclosed,
        });

        Ok(ProbeReport::complete(score, details, findings))
    }
}
