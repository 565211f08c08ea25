//! SSL/TLS certificate inspection probe

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::debug;
use x509_parser::prelude::*;

use super::{ProbeAdapter, ProbeReport};
use crate::application::errors::ProbeError;
use crate::domain::{ProbeKind, ScanTarget};

const EXPIRY_WARNING_DAYS: i64 = 30;

/// What a completed TLS handshake revealed about the target
#[derive(Debug)]
struct TlsInspection {
    handshake_error: Option<String>,
    certificate: Option<CertificateSummary>,
}

#[derive(Debug)]
struct CertificateSummary {
    subject: String,
    issuer: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    days_until_expiry: i64,
    self_signed: bool,
}

/// Connects to the target's TLS port and judges the served certificate
pub struct SslProbe {
    connect_timeout: Duration,
}

impl SslProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl ProbeAdapter for SslProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Ssl
    }

    async fn probe(&self, target: &ScanTarget) -> Result<ProbeReport, ProbeError> {
        if !target.is_https() {
            return Ok(ProbeReport::complete(
                0,
                json!({ "https": false }),
                vec!["ssl_not_enabled".to_string()],
            ));
        }

        let host = target.host().to_string();
        let port = target.port_or_default();
        let connect_timeout = self.connect_timeout;

        debug!(host = %host, port, "inspecting TLS certificate");

        // native-tls drives a blocking TCP stream, so the handshake runs on
        // the blocking pool instead of stalling the scan worker.
        let inspection =
            tokio::task::spawn_blocking(move || inspect_tls(&host, port, connect_timeout))
                .await
                .map_err(|e| ProbeError::Internal {
                    message: format!("TLS inspection task failed: {}", e),
                })??;

        Ok(evaluate(inspection))
    }
}

fn inspect_tls(host: &str, port: u16, connect_timeout: Duration) -> Result<TlsInspection, ProbeError> {
    let addr = (host, port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| ProbeError::DnsResolution {
            host: host.to_string(),
        })?;

    // Accept invalid certificates at the transport level so expired or
    // self-signed ones can still be retrieved and judged below.
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()?;

    let stream = TcpStream::connect_timeout(&addr, connect_timeout)?;
    stream.set_read_timeout(Some(connect_timeout))?;
    stream.set_write_timeout(Some(connect_timeout))?;

    let tls_stream = match connector.connect(host, stream) {
        Ok(s) => s,
        Err(e) => {
            return Ok(TlsInspection {
                handshake_error: Some(e.to_string()),
                certificate: None,
            });
        }
    };

    let certificate = match tls_stream.peer_certificate() {
        Ok(Some(cert)) => {
            let der = cert.to_der().map_err(ProbeError::Tls)?;
            parse_certificate(&der)
        }
        Ok(None) => None,
        Err(e) => {
            return Ok(TlsInspection {
                handshake_error: Some(format!("could not read peer certificate: {}", e)),
                certificate: None,
            });
        }
    };

    Ok(TlsInspection {
        handshake_error: None,
        certificate,
    })
}

fn parse_certificate(der: &[u8]) -> Option<CertificateSummary> {
    let (_, x509) = X509Certificate::from_der(der).ok()?;
    let validity = x509.validity();
    let not_before = asn1_time_to_utc(&validity.not_before);
    let not_after = asn1_time_to_utc(&validity.not_after);

    Some(CertificateSummary {
        subject: x509.subject().to_string(),
        issuer: x509.issuer().to_string(),
        not_before,
        not_after,
        days_until_expiry: not_after.signed_duration_since(Utc::now()).num_days(),
        self_signed: x509.subject().to_string() == x509.issuer().to_string(),
    })
}

fn asn1_time_to_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}

fn evaluate(inspection: TlsInspection) -> ProbeReport {
    if let Some(error) = inspection.handshake_error {
        return ProbeReport::complete(
            0,
            json!({ "https": true, "handshake_error": error }),
            vec!["ssl_handshake_failed".to_string()],
        );
    }

    let Some(cert) = inspection.certificate else {
        return ProbeReport::partial(
            50,
            json!({ "https": true, "certificate": null }),
            vec![],
        );
    };

    let now = Utc::now();
    let expired = now < cert.not_before || now > cert.not_after;

    let mut score: u8 = 100;
    let mut findings = Vec::new();

    if expired {
        score = 10;
        findings.push("ssl_expired".to_string());
    } else if (0..=EXPIRY_WARNING_DAYS).contains(&cert.days_until_expiry) {
        score = score.saturating_sub(20);
        findings.push("ssl_expiring_soon".to_string());
    }

    if cert.self_signed {
        score = score.saturating_sub(40);
        findings.push("ssl_self_signed".to_string());
    }

    let details = json!({
        "https": true,
        "certificate": {
            "subject": cert.subject,
            "issuer": cert.issuer,
            "not_before": cert.not_before.to_rfc3339(),
            "not_after": cert.not_after.to_rfc3339(),
            "days_until_expiry": cert.days_until_expiry,
            "self_signed": cert.self_signed,
        }
    });

    ProbeReport::complete(score, details, findings)
}
