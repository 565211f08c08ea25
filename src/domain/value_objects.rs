//! Domain value objects representing immutable concepts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use super::errors::DomainError;

/// The closed catalog of security probe categories.
///
/// Declaration order is significant: it defines the deterministic ordering of
/// probe outcomes and recommendations in every composite result, regardless of
/// the order probes were requested or finished in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Ssl,
    Ports,
    Headers,
    Cms,
    Ddos,
}

impl ProbeKind {
    /// All probe kinds in declaration order
    pub fn all() -> [ProbeKind; 5] {
        [
            ProbeKind::Ssl,
            ProbeKind::Ports,
            ProbeKind::Headers,
            ProbeKind::Cms,
            ProbeKind::Ddos,
        ]
    }

    /// Get the canonical wire name for this probe kind
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ProbeKind::Ssl => "ssl",
            ProbeKind::Ports => "ports",
            ProbeKind::Headers => "headers",
            ProbeKind::Cms => "cms",
            ProbeKind::Ddos => "ddos",
        }
    }

    /// Relative weight of this probe kind in the composite score.
    ///
    /// Weights sum to 1.0 across the full catalog; the scoring engine
    /// renormalizes over the subset of probes that produced usable scores.
    pub fn weight(&self) -> f64 {
        match self {
            ProbeKind::Ssl => 0.25,
            ProbeKind::Ports => 0.20,
            ProbeKind::Headers => 0.25,
            ProbeKind::Cms => 0.20,
            ProbeKind::Ddos => 0.10,
        }
    }
}

impl fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

impl FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ssl" | "https" => Ok(ProbeKind::Ssl),
            "ports" | "port" => Ok(ProbeKind::Ports),
            "headers" | "header" => Ok(ProbeKind::Headers),
            "cms" => Ok(ProbeKind::Cms),
            "ddos" => Ok(ProbeKind::Ddos),
            _ => Err(format!("Unknown scan type: {}", s)),
        }
    }
}

/// A validated scan target.
///
/// Only syntactically valid absolute http/https URLs with a host component are
/// accepted; scheme-less input is rejected rather than silently upgraded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanTarget(#[serde(with = "target_serde")] Url);

impl ScanTarget {
    /// Parse and validate a target URL
    pub fn parse(input: &str) -> Result<Self, DomainError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(DomainError::InvalidTarget {
                reason: "target URL cannot be empty".to_string(),
            });
        }

        let url = Url::parse(input).map_err(|e| DomainError::InvalidTarget {
            reason: e.to_string(),
        })?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(DomainError::InvalidTarget {
                    reason: format!("unsupported scheme '{}'", other),
                });
            }
        }

        if url.host_str().is_none() {
            return Err(DomainError::InvalidTarget {
                reason: "target URL has no host".to_string(),
            });
        }

        Ok(ScanTarget(url))
    }

    /// The host component of the target
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Whether the target uses the https scheme
    pub fn is_https(&self) -> bool {
        self.0.scheme() == "https"
    }

    /// The explicit port, or the scheme default (80/443)
    pub fn port_or_default(&self) -> u16 {
        self.0.port_or_known_default().unwrap_or(443)
    }

    /// The full URL as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScanTarget {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Serde handling for the inner Url: deserialization re-validates through
/// `ScanTarget::parse` so stored records can never smuggle in an invalid target.
mod target_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use url::Url;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        url.as_str().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::ScanTarget::parse(&s)
            .map(|target| target.0)
            .map_err(serde::de::Error::custom)
    }
}

/// Supported report locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ru,
    Uz,
    En,
}

impl Locale {
    /// Resolve a language tag, falling back to the default locale for
    /// anything unrecognized (a bad language tag never fails a scan request)
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "uz" => Locale::Uz,
            "en" => Locale::En,
            _ => Locale::Ru,
        }
    }

    /// Get the canonical language tag
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::Ru => "ru",
            Locale::Uz => "uz",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}
