//! Composing the final [`ResearchReport`]

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use super::session::ResearchSession;
use crate::model::{ResearchReport, Signal};
use crate::specialists::SpecialistKind;

/// Metrics a complete session carries in `stock_data`
const EXPECTED_METRICS: [&str; 3] = ["quote", "fundamentals", "technical"];

/// Ceiling for a report composed without the model
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Shape the report prompt asks the model for; every key is optional
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ReportDraft {
    summary: String,
    fundamental_analysis: String,
    technical_analysis: String,
    sentiment_analysis: String,
    recommendation: String,
    key_risks: Vec<String>,
    confidence: Option<f64>,
}

/// Extract the JSON object from a model reply, tolerating code fences and prose
pub(crate) fn parse_draft(text: &str) -> Option<ReportDraft> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Share of the expected data that was actually gathered, in [0, 1]
pub(crate) fn completeness(session: &ResearchSession) -> f64 {
    let present = EXPECTED_METRICS
        .iter()
        .filter(|key| session.stock_data.contains_key(**key))
        .count()
        + usize::from(!session.news_data.is_empty());
    present as f64 / (EXPECTED_METRICS.len() + 1) as f64
}

fn signal(session: &ResearchSession) -> Option<Signal> {
    session
        .stock_data
        .get("signal")
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
}

fn recommendation_for(signal: Option<Signal>) -> String {
    match signal {
        Some(Signal::Buy) => {
            "BUY: price trades above its 50-day average without overbought RSI.".to_string()
        }
        Some(Signal::Sell) => {
            "SELL: price trades below its 50-day average without oversold RSI.".to_string()
        }
        Some(Signal::Neutral) => "HOLD: the technical signal is neutral.".to_string(),
        None => "NO RATING: the technical signal could not be computed.".to_string(),
    }
}

fn note(session: &ResearchSession, kind: SpecialistKind) -> String {
    session
        .specialist_notes
        .get(&kind)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| format!("No {kind} findings were produced."))
}

fn first_paragraph(text: &str) -> Option<String> {
    text.split("\n\n")
        .map(str::trim)
        .find(|paragraph| !paragraph.is_empty())
        .map(ToString::to_string)
}

/// Report built only from the session, used when the model cannot be asked
/// or its answer cannot be parsed
pub(crate) fn compose_fallback(session: &ResearchSession) -> ResearchReport {
    let summary = first_paragraph(&session.analysis).unwrap_or_else(|| {
        format!(
            "Automated research on {} compiled from specialist findings without a synthesized analysis.",
            session.ticker
        )
    });

    ResearchReport {
        ticker: session.ticker.clone(),
        generated_at: Utc::now(),
        summary,
        fundamental_analysis: note(session, SpecialistKind::Fundamental),
        technical_analysis: note(session, SpecialistKind::Technical),
        sentiment_analysis: note(session, SpecialistKind::Sentiment),
        recommendation: recommendation_for(signal(session)),
        key_risks: session.data_gaps.clone(),
        iteration_count: session.iteration_count,
        confidence: ResearchReport::clamp_confidence(FALLBACK_CONFIDENCE * completeness(session)),
        data_gaps: session.data_gaps.clone(),
    }
}

/// Merge a parsed draft over the fallback; blank fields keep the fallback text
pub(crate) fn compose(session: &ResearchSession, draft: ReportDraft) -> ResearchReport {
    let fallback = compose_fallback(session);
    let pick = |text: String, default: String| {
        if text.trim().is_empty() { default } else { text.trim().to_string() }
    };

    let key_risks: Vec<String> = draft
        .key_risks
        .into_iter()
        .map(|risk| risk.trim().to_string())
        .filter(|risk| !risk.is_empty())
        .collect();

    ResearchReport {
        summary: pick(draft.summary, fallback.summary),
        fundamental_analysis: pick(draft.fundamental_analysis, fallback.fundamental_analysis),
        technical_analysis: pick(draft.technical_analysis, fallback.technical_analysis),
        sentiment_analysis: pick(draft.sentiment_analysis, fallback.sentiment_analysis),
        recommendation: pick(draft.recommendation, fallback.recommendation),
        key_risks: if key_risks.is_empty() { fallback.key_risks } else { key_risks },
        confidence: draft
            .confidence
            .map_or(fallback.confidence, ResearchReport::clamp_confidence),
        ..fallback
    }
}

/// Variables for the report prompt
pub(crate) fn prompt_vars(session: &ResearchSession) -> Value {
    serde_json::json!({
        "ticker": session.ticker,
        "analysis": session.analysis,
        "critique": session.critique,
        "data_gaps": session.data_gaps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialists::SpecialistReport;
    use crate::testing::news_item;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn gathered() -> ResearchSession {
        ResearchSession::new("MSFT").with_plan("plan").absorb([
            SpecialistReport {
                kind: SpecialistKind::Technical,
                analysis: "Above MA50.".into(),
                metrics: BTreeMap::from([
                    ("technical".to_string(), json!({"rsi": 55.0})),
                    ("signal".to_string(), json!("BUY")),
                ]),
                news: Vec::new(),
                gaps: Vec::new(),
            },
            SpecialistReport {
                kind: SpecialistKind::Sentiment,
                analysis: "Upbeat.".into(),
                metrics: BTreeMap::new(),
                news: vec![news_item("Cloud beats")],
                gaps: Vec::new(),
            },
            SpecialistReport::skipped(SpecialistKind::Fundamental, "step budget exhausted"),
        ])
    }

    #[test]
    fn test_parse_draft_tolerates_fences() {
        let text = "Here you go:\n```json\n{\"summary\": \"ok\", \"confidence\": 0.8}\n```";
        let draft = parse_draft(text).unwrap();
        assert_eq!(draft.summary, "ok");
        assert_eq!(draft.confidence, Some(0.8));
        assert!(parse_draft("no json at all").is_none());
        assert!(parse_draft("} backwards {").is_none());
    }

    #[test]
    fn test_completeness() {
        let session = gathered();
        assert!((completeness(&session) - 0.5).abs() < 1e-9);
        assert_eq!(completeness(&ResearchSession::new("X")), 0.0);
    }

    #[test]
    fn test_fallback_uses_signal_and_gaps() {
        let report = compose_fallback(&gathered());
        assert!(report.recommendation.starts_with("BUY"));
        assert_eq!(report.technical_analysis, "Above MA50.");
        assert_eq!(report.key_risks, vec!["fundamental-analyst skipped: step budget exhausted"]);
        assert_eq!(report.data_gaps, report.key_risks);
        assert!((report.confidence - 0.25).abs() < 1e-9);
        assert!(report.summary.contains("MSFT"));
    }

    #[test]
    fn test_compose_clamps_and_fills_blanks() {
        let draft = parse_draft(
            r#"{"summary": "Strong quarter", "recommendation": "", "key_risks": [" FX "], "confidence": 1.4}"#,
        )
        .unwrap();
        let report = compose(&gathered(), draft);
        assert_eq!(report.summary, "Strong quarter");
        assert!(report.recommendation.starts_with("BUY"));
        assert_eq!(report.key_risks, vec!["FX"]);
        assert_eq!(report.confidence, 1.0);
        assert_eq!(report.sentiment_analysis, "Upbeat.");
    }
}
