//! Domain services: the pure scoring engine

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use uuid::Uuid;

use super::entities::{CompositeResult, JobState, ProbeOutcome};
use super::value_objects::{Locale, ProbeKind};

/// Maximum number of recommendations carried by a composite result
const MAX_RECOMMENDATIONS: usize = 15;

/// Minimum composite score at which a site qualifies for the "certified" badge
pub const CERTIFICATE_ELIGIBLE_SCORE: u8 = 80;

/// Coarse classification of a composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityLevel {
    Excellent,
    Good,
    Warning,
    Critical,
}

impl SecurityLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=100 => SecurityLevel::Excellent,
            80..=89 => SecurityLevel::Good,
            60..=79 => SecurityLevel::Warning,
            _ => SecurityLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityLevel::Excellent => "excellent",
            SecurityLevel::Good => "good",
            SecurityLevel::Warning => "warning",
            SecurityLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordered catalog of finding codes the rule table recognizes per probe kind.
/// The order here fixes the order of recommendations within one probe.
pub(crate) fn rule_table(kind: ProbeKind) -> &'static [&'static str] {
    match kind {
        ProbeKind::Ssl => &[
            "ssl_not_enabled",
            "ssl_handshake_failed",
            "ssl_expired",
            "ssl_expiring_soon",
            "ssl_self_signed",
        ],
        ProbeKind::Ports => &[
            "telnet_exposed",
            "ftp_exposed",
            "rdp_exposed",
            "database_exposed",
        ],
        ProbeKind::Headers => &[
            "hsts_missing",
            "csp_missing",
            "x_frame_options_missing",
            "x_content_type_options_missing",
            "referrer_policy_missing",
            "server_header_disclosed",
        ],
        ProbeKind::Cms => &["cms_version_disclosed", "cms_files_exposed"],
        ProbeKind::Ddos => &["no_cdn", "no_rate_limiting", "single_origin_ip"],
    }
}

/// Pure aggregation of probe outcomes into one composite result.
///
/// No I/O, no clocks: the same outcomes always produce the same result,
/// which is what makes scores and recommendations reproducible.
pub struct ScoringEngine;

impl ScoringEngine {
    /// Build the frozen composite result for a job
    pub fn evaluate(
        job_id: Uuid,
        outcomes: BTreeMap<ProbeKind, ProbeOutcome>,
        locale: Locale,
    ) -> CompositeResult {
        let score = Self::composite_score(&outcomes);
        let recommendations = Self::recommendations(&outcomes, locale);
        CompositeResult {
            job_id,
            score,
            recommendations,
            outcomes,
        }
    }

    /// Weighted composite score over the probes that produced usable
    /// sub-scores, renormalized against only their weights. A probe that
    /// timed out or failed lowers confidence but never zeroes the composite.
    /// Rounding is half-up at this final step only.
    pub fn composite_score(outcomes: &BTreeMap<ProbeKind, ProbeOutcome>) -> u8 {
        let mut weighted = 0.0_f64;
        let mut total_weight = 0.0_f64;

        for (kind, outcome) in outcomes {
            if let Some(score) = outcome.score.filter(|_| outcome.has_usable_score()) {
                weighted += f64::from(score) * kind.weight();
                total_weight += kind.weight();
            }
        }

        if total_weight <= f64::EPSILON {
            return 0;
        }

        let composite = (weighted / total_weight + 0.5).floor();
        composite.clamp(0.0, 100.0) as u8
    }

    /// Terminal state implied by a complete outcome set
    pub fn terminal_state(outcomes: &BTreeMap<ProbeKind, ProbeOutcome>) -> JobState {
        let usable = outcomes.values().filter(|o| o.has_usable_score()).count();
        if usable == 0 {
            JobState::Failed
        } else if usable < outcomes.len() {
            JobState::PartialFailure
        } else {
            JobState::Completed
        }
    }

    /// Locale-rendered recommendations, ordered by probe-kind declaration
    /// order, de-duplicated, and capped.
    pub fn recommendations(
        outcomes: &BTreeMap<ProbeKind, ProbeOutcome>,
        locale: Locale,
    ) -> Vec<String> {
        let mut recommendations = Vec::new();

        for kind in ProbeKind::all() {
            let Some(outcome) = outcomes.get(&kind) else {
                continue;
            };

            if !outcome.outcome.is_usable() {
                recommendations.push(locale.could_not_verify(kind));
                continue;
            }

            for code in rule_table(kind) {
                if outcome.findings.iter().any(|finding| finding == code) {
                    if let Some(phrase) = locale.recommendation(code) {
                        recommendations.push(phrase.to_string());
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        recommendations.retain(|r| seen.insert(r.clone()));
        recommendations.truncate(MAX_RECOMMENDATIONS);
        recommendations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn success(kind: ProbeKind, score: u8) -> ProbeOutcome {
        ProbeOutcome::success(kind, score, Value::Null, vec![])
    }

    fn success_with_findings(kind: ProbeKind, score: u8, findings: &[&str]) -> ProbeOutcome {
        ProbeOutcome::success(
            kind,
            score,
            Value::Null,
            findings.iter().map(|f| f.to_string()).collect(),
        )
    }

    fn outcomes(entries: Vec<ProbeOutcome>) -> BTreeMap<ProbeKind, ProbeOutcome> {
        entries.into_iter().map(|o| (o.probe, o)).collect()
    }

    #[test]
    fn test_equal_weights_average() {
        // ssl and headers carry the same catalog weight (0.25 each)
        let set = outcomes(vec![
            success(ProbeKind::Ssl, 90),
            success(ProbeKind::Headers, 70),
        ]);
        assert_eq!(ScoringEngine::composite_score(&set), 80);
        assert_eq!(ScoringEngine::terminal_state(&set), JobState::Completed);
    }

    #[test]
    fn test_timeout_renormalizes_instead_of_zeroing() {
        let set = outcomes(vec![
            success(ProbeKind::Ssl, 90),
            ProbeOutcome::timeout(ProbeKind::Headers, "exceeded limit"),
        ]);
        assert_eq!(ScoringEngine::composite_score(&set), 90);
        assert_eq!(
            ScoringEngine::terminal_state(&set),
            JobState::PartialFailure
        );
    }

    #[test]
    fn test_all_failed_scores_zero() {
        let set = outcomes(vec![
            ProbeOutcome::failure(ProbeKind::Ssl, "boom"),
            ProbeOutcome::timeout(ProbeKind::Headers, "exceeded limit"),
        ]);
        assert_eq!(ScoringEngine::composite_score(&set), 0);
        assert_eq!(ScoringEngine::terminal_state(&set), JobState::Failed);
    }

    #[test]
    fn test_rounding_is_half_up_at_final_step() {
        // (85 + 70) / 2 = 77.5 -> 78
        let set = outcomes(vec![
            success(ProbeKind::Ssl, 85),
            success(ProbeKind::Headers, 70),
        ]);
        assert_eq!(ScoringEngine::composite_score(&set), 78);
    }

    #[test]
    fn test_uneven_weights_are_respected() {
        // ssl 0.25, ddos 0.10: (100*0.25 + 0*0.10) / 0.35 = 71.43 -> 71
        let set = outcomes(vec![
            success(ProbeKind::Ssl, 100),
            success(ProbeKind::Ddos, 0),
        ]);
        assert_eq!(ScoringEngine::composite_score(&set), 71);
    }

    #[test]
    fn test_score_stays_within_bounds() {
        let set = outcomes(vec![
            success(ProbeKind::Ssl, 100),
            success(ProbeKind::Ports, 100),
            success(ProbeKind::Headers, 100),
            success(ProbeKind::Cms, 100),
            success(ProbeKind::Ddos, 100),
        ]);
        assert_eq!(ScoringEngine::composite_score(&set), 100);

        let set = outcomes(vec![success(ProbeKind::Ssl, 0)]);
        assert_eq!(ScoringEngine::composite_score(&set), 0);
    }

    #[test]
    fn test_raising_one_score_never_lowers_composite() {
        for base in [0u8, 35, 70] {
            let low = outcomes(vec![
                success(ProbeKind::Ssl, 60),
                success(ProbeKind::Headers, base),
                ProbeOutcome::timeout(ProbeKind::Ddos, "exceeded limit"),
            ]);
            let high = outcomes(vec![
                success(ProbeKind::Ssl, 60),
                success(ProbeKind::Headers, base.saturating_add(20)),
                ProbeOutcome::timeout(ProbeKind::Ddos, "exceeded limit"),
            ]);
            assert!(
                ScoringEngine::composite_score(&high) >= ScoringEngine::composite_score(&low),
                "monotonicity violated at base {}",
                base
            );
        }
    }

    #[test]
    fn test_recommendations_follow_declaration_order() {
        // headers sorts after ssl in the catalog even though it is pushed
        // with a "smaller" finding set
        let set = outcomes(vec![
            success_with_findings(ProbeKind::Headers, 60, &["hsts_missing", "csp_missing"]),
            success_with_findings(ProbeKind::Ssl, 70, &["ssl_expiring_soon"]),
        ]);
        let recs = ScoringEngine::recommendations(&set, Locale::En);
        assert_eq!(
            recs,
            vec![
                "Renew the SSL certificate before it expires".to_string(),
                "Add the Strict-Transport-Security header".to_string(),
                "Configure a Content Security Policy".to_string(),
            ]
        );
    }

    #[test]
    fn test_failed_probe_yields_could_not_verify() {
        let set = outcomes(vec![
            success(ProbeKind::Ssl, 95),
            ProbeOutcome::timeout(ProbeKind::Headers, "exceeded limit"),
        ]);
        let recs = ScoringEngine::recommendations(&set, Locale::En);
        assert_eq!(
            recs,
            vec!["Could not verify HTTP security headers, retry the scan later".to_string()]
        );
    }

    #[test]
    fn test_unknown_finding_codes_are_ignored() {
        let set = outcomes(vec![success_with_findings(
            ProbeKind::Ssl,
            90,
            &["made_up_code"],
        )]);
        assert!(ScoringEngine::recommendations(&set, Locale::Ru).is_empty());
    }

    #[test]
    fn test_security_level_thresholds() {
        assert_eq!(SecurityLevel::from_score(100), SecurityLevel::Excellent);
        assert_eq!(SecurityLevel::from_score(90), SecurityLevel::Excellent);
        assert_eq!(SecurityLevel::from_score(89), SecurityLevel::Good);
        assert_eq!(SecurityLevel::from_score(80), SecurityLevel::Good);
        assert_eq!(SecurityLevel::from_score(79), SecurityLevel::Warning);
        assert_eq!(SecurityLevel::from_score(60), SecurityLevel::Warning);
        assert_eq!(SecurityLevel::from_score(59), SecurityLevel::Critical);
        assert_eq!(SecurityLevel::from_score(0), SecurityLevel::Critical);
    }
}
