//! TCP port exposure probe

use async_trait::async_trait;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpStream, lookup_host};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::debug;

use super::{ProbeAdapter, ProbeReport};
use crate::application::errors::ProbeError;
use crate::domain::{ProbeKind, ScanTarget};

/// Well-known ports swept by the probe
const SCAN_PORTS: &[(u16, &str)] = &[
    (21, "ftp"),
    (22, "ssh"),
    (23, "telnet"),
    (25, "smtp"),
    (53, "dns"),
    (80, "http"),
    (110, "pop3"),
    (143, "imap"),
    (443, "https"),
    (465, "smtps"),
    (993, "imaps"),
    (995, "pop3s"),
    (1433, "mssql"),
    (3306, "mysql"),
    (3389, "rdp"),
    (5432, "postgresql"),
    (6379, "redis"),
    (8080, "http-alt"),
    (8443, "https-alt"),
    (27017, "mongodb"),
];

/// Ports whose exposure to the internet is a finding in itself:
/// port, finding code, score deduction.
const DANGEROUS_PORTS: &[(u16, &str, u8)] = &[
    (21, "ftp_exposed", 15),
    (23, "telnet_exposed", 20),
    (3389, "rdp_exposed", 15),
    (1433, "database_exposed", 15),
    (3306, "database_exposed", 15),
    (5432, "database_exposed", 15),
    (6379, "database_exposed", 15),
    (27017, "database_exposed", 15),
];

/// Sweeps the target's well-known TCP ports with bounded connect attempts
pub struct PortProbe {
    connect_timeout: Duration,
}

impl PortProbe {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl ProbeAdapter for PortProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Ports
    }

    async fn probe(&self, target: &ScanTarget) -> Result<ProbeReport, ProbeError> {
        let host = target.host().to_string();

        // Resolve once and connect to the address directly so the sweep does
        // not repeat a DNS lookup per port.
        let address = lookup_host((host.as_str(), target.port_or_default()))
            .await?
            .next()
            .ok_or_else(|| ProbeError::DnsResolution { host: host.clone() })?;

        debug!(host = %host, address = %address, "sweeping well-known ports");

        let mut attempts: JoinSet<(u16, &'static str, bool)> = JoinSet::new();
        for (port, service) in SCAN_PORTS {
            let addr = SocketAddr::new(address.ip(), *port);
            let connect_timeout = self.connect_timeout;
            attempts.spawn(async move {
                let open = matches!(
                    timeout(connect_timeout, TcpStream::connect(addr)).await,
                    Ok(Ok(_))
                );
                (addr.port(), *service, open)
            });
        }

        let mut open_ports: Vec<(u16, &'static str)> = Vec::new();
        while let Some(result) = attempts.join_next().await {
            if let Ok((port, service, true)) = result {
                open_ports.push((port, service));
            }
        }
        open_ports.sort_by_key(|(port, _)| *port);

        let mut score: u8 = 100;
        let mut findings = Vec::new();
        for (port, code, deduction) in DANGEROUS_PORTS {
            if open_ports.iter().any(|(open, _)| open == port) {
                if !findings.iter().any(|f| f == code) {
                    findings.push(code.to_string());
                }
                score = score.saturating_sub(*deduction);
            }
        }

        let details = json!({
            "address": address.ip().to_string(),
            "scanned": SCAN_PORTS.len(),
            "open_ports": open_ports
                .iter()
                .map(|(port, service)| json!({ "port": port, "service": service }))
                .collect::<Vec<_>>(),
        });

        Ok(ProbeReport::complete(score, details, findings))
    }
}
