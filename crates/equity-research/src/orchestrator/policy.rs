//! Deciding whether a critiqued draft goes back for revision

use regex::Regex;
use std::sync::LazyLock;

use super::session::ResearchSession;

static VERDICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)VERDICT:\s*\**\s*(REVISE|ACCEPT)").expect("verdict pattern is valid")
});

/// Decides `needs_revision` after a critique
pub trait RevisionPolicy: Send + Sync {
    fn needs_revision(&self, session: &ResearchSession) -> bool;
}

impl<F> RevisionPolicy for F
where
    F: Fn(&ResearchSession) -> bool + Send + Sync,
{
    fn needs_revision(&self, session: &ResearchSession) -> bool {
        self(session)
    }
}

/// Structural check of the draft: all three dimensions are discussed and,
/// when gaps were recorded, the draft acknowledges them
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessPolicy;

impl CompletenessPolicy {
    const DIMENSIONS: [&'static str; 3] = ["fundamental", "technical", "sentiment"];
    const GAP_MARKERS: [&'static str; 4] = ["gap", "unavailable", "missing", "not available"];

    /// Dimensions the draft never mentions
    pub fn missing_dimensions(analysis: &str) -> Vec<&'static str> {
        let lower = analysis.to_lowercase();
        Self::DIMENSIONS
            .into_iter()
            .filter(|dimension| !lower.contains(dimension))
            .collect()
    }

    fn acknowledges_gaps(analysis: &str) -> bool {
        let lower = analysis.to_lowercase();
        Self::GAP_MARKERS.iter().any(|marker| lower.contains(marker))
    }
}

impl RevisionPolicy for CompletenessPolicy {
    fn needs_revision(&self, session: &ResearchSession) -> bool {
        if !Self::missing_dimensions(&session.analysis).is_empty() {
            return true;
        }
        !session.data_gaps.is_empty() && !Self::acknowledges_gaps(&session.analysis)
    }
}

/// Follows the critic's `VERDICT:` line, falling back to [`CompletenessPolicy`]
#[derive(Debug, Clone, Copy, Default)]
pub struct CritiqueVerdictPolicy {
    fallback: CompletenessPolicy,
}

impl CritiqueVerdictPolicy {
    /// `Some(true)` for REVISE, `Some(false)` for ACCEPT; the last verdict wins
    pub fn parse_verdict(critique: &str) -> Option<bool> {
        VERDICT
            .captures_iter(critique)
            .last()
            .map(|caps| caps[1].eq_ignore_ascii_case("REVISE"))
    }
}

impl RevisionPolicy for CritiqueVerdictPolicy {
    fn needs_revision(&self, session: &ResearchSession) -> bool {
        Self::parse_verdict(&session.critique)
            .unwrap_or_else(|| self.fallback.needs_revision(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(analysis: &str, critique: &str, gaps: &[&str]) -> ResearchSession {
        let mut session = ResearchSession::new("AAPL")
            .with_analysis(analysis)
            .with_critique(critique);
        for gap in gaps {
            session.record_gap(*gap);
        }
        session
    }

    const COMPLETE: &str = "Fundamental: solid. Technical: uptrend. Sentiment: upbeat.";

    #[test]
    fn test_parse_verdict() {
        assert_eq!(CritiqueVerdictPolicy::parse_verdict("Fine.\nVERDICT: ACCEPT"), Some(false));
        assert_eq!(CritiqueVerdictPolicy::parse_verdict("verdict: revise"), Some(true));
        assert_eq!(CritiqueVerdictPolicy::parse_verdict("**VERDICT:** REVISE"), Some(true));
        assert_eq!(
            CritiqueVerdictPolicy::parse_verdict("VERDICT: REVISE\n...\nVERDICT: ACCEPT"),
            Some(false)
        );
        assert_eq!(CritiqueVerdictPolicy::parse_verdict("Looks good overall."), None);
    }

    #[test]
    fn test_verdict_overrides_structure() {
        let policy = CritiqueVerdictPolicy::default();
        assert!(policy.needs_revision(&session(COMPLETE, "VERDICT: REVISE", &[])));
        assert!(!policy.needs_revision(&session("short", "VERDICT: ACCEPT", &[])));
    }

    #[test]
    fn test_fallback_to_completeness() {
        let policy = CritiqueVerdictPolicy::default();
        assert!(!policy.needs_revision(&session(COMPLETE, "no verdict here", &[])));
        assert!(policy.needs_revision(&session("Fundamental only.", "", &[])));
    }

    #[test]
    fn test_completeness_requires_gap_acknowledgement() {
        let gaps = ["financial data unavailable for AAPL"];
        assert!(CompletenessPolicy.needs_revision(&session(COMPLETE, "", &gaps)));

        let acknowledged = format!("{COMPLETE} Data gaps: revenue was missing.");
        assert!(!CompletenessPolicy.needs_revision(&session(&acknowledged, "", &gaps)));
    }

    #[test]
    fn test_missing_dimensions() {
        assert_eq!(
            CompletenessPolicy::missing_dimensions("TECHNICAL picture only"),
            vec!["fundamental", "sentiment"]
        );
    }

    #[test]
    fn test_closure_policy() {
        let always = |_: &ResearchSession| true;
        assert!(always.needs_revision(&session("", "", &[])));
    }
}
