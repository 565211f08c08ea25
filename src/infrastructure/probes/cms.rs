//! CMS fingerprinting probe

use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use super::{ProbeAdapter, ProbeReport};
use crate::application::errors::ProbeError;
use crate::domain::{ProbeKind, ScanTarget};

/// Upper bound on how much of the landing page body is inspected
const BODY_INSPECT_LIMIT: usize = 262_144;

/// CMS signatures: name, body markers, and a well-known file whose public
/// availability counts as an exposed system file.
const SIGNATURES: &[(&str, &[&str], Option<&str>)] = &[
    (
        "WordPress",
        &["wp-content", "wp-includes"],
        Some("readme.html"),
    ),
    (
        "Joomla",
        &["/media/jui/", "com_content"],
        Some("administrator/manifests/files/joomla.xml"),
    ),
    (
        "Drupal",
        &["drupal.js", "sites/default/files"],
        Some("CHANGELOG.txt"),
    ),
    ("1C-Bitrix", &["/bitrix/js/", "/bitrix/templates/"], None),
];

/// Fingerprints the target's CMS from its landing page
pub struct CmsProbe {
    client: reqwest::Client,
}

impl CmsProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Extract the content of a `<meta name="generator">` tag, if present.
    /// Matching and extraction both run over a lowercased copy so byte
    /// offsets stay consistent; the returned value is lowercase.
    fn generator_meta(body: &str) -> Option<String> {
        let lower = body.to_lowercase();
        let meta_start = lower.find("name=\"generator\"")?;
        let rest = &lower[meta_start..];
        let content_start = rest.find("content=\"")? + "content=\"".len();
        let content = &rest[content_start..];
        let content_end = content.find('"')?;
        Some(content[..content_end].trim().to_string())
    }

    async fn well_known_file_exposed(&self, target: &ScanTarget, file: &str) -> bool {
        let Ok(base) = url::Url::parse(target.as_str()) else {
            return false;
        };
        let Ok(probe_url) = base.join(file) else {
            return false;
        };
        match self.client.get(probe_url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}

#[async_trait]
impl ProbeAdapter for CmsProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Cms
    }

    async fn probe(&self, target: &ScanTarget) -> Result<ProbeReport, ProbeError> {
        debug!(target = %target, "fingerprinting CMS");
        let response = self.client.get(target.as_str()).send().await?;
        let body = response.text().await?;
        let mut cut = body.len().min(BODY_INSPECT_LIMIT);
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        let body = &body[..cut];
        let body_lower = body.to_lowercase();

        let generator = Self::generator_meta(body);
        let mut detected: Option<&str> = None;
        let mut exposed_file: Option<String> = None;

        for (name, markers, well_known) in SIGNATURES {
            let in_generator = generator
                .as_deref()
                .map(|g| g.to_lowercase().contains(&name.to_lowercase()))
                .unwrap_or(false);
            let in_body = markers
                .iter()
                .any(|marker| body_lower.contains(&marker.to_lowercase()));

            if in_generator || in_body {
                detected = Some(*name);
                if let Some(file) = well_known {
                    if self.well_known_file_exposed(target, file).await {
                        exposed_file = Some(file.to_string());
                    }
                }
                break;
            }
        }

        let version_disclosed = generator
            .as_deref()
            .map(|g| g.chars().any(|c| c.is_ascii_digit()))
            .unwrap_or(false);

        let mut score: u8 = 100;
        let mut findings = Vec::new();

        if detected.is_some() {
            score = 85;
            if version_disclosed {
                score = score.saturating_sub(25);
                findings.push("cms_version_disclosed".to_string());
            }
            if exposed_file.is_some() {
                score = score.saturating_sub(20);
                findings.push("cms_files_exposed".to_string());
            }
        }

        let details = json!({
            "detected": detected.is_some(),
            "name": detected,
            "generator": generator,
            "version_disclosed": version_disclosed,
            "exposed_file": exposed_file,
        });

        Ok(ProbeReport::complete(score, details, findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generator_meta_extraction() {
        let body = r#"<html><head>
            <meta name="generator" content="WordPress 6.4.2" />
        </head></html>"#;
        assert_eq!(
            CmsProbe::generator_meta(body).as_deref(),
            Some("wordpress 6.4.2")
        );
    }

    #[test]
    fn test_generator_meta_absent() {
        assert!(CmsProbe::generator_meta("<html><head></head></html>").is_none());
        assert!(CmsProbe::generator_meta("").is_none());
    }

    #[test]
    fn test_generator_meta_unterminated_content() {
        assert!(CmsProbe::generator_meta(r#"<meta name="generator" content="broken"#).is_none());
    }
}
