//! Records produced by the gateways and the final report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Day change in percent, rounded to two decimals; zero when `previous` is zero
pub fn change_percent(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    round2((current - previous) / previous * 100.0)
}

/// Current quote for a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockPrice {
    pub symbol: String,
    pub current_price: f64,
    pub previous_close: f64,
    pub change_percent: f64,
    pub volume: u64,
    pub market_cap: Option<f64>,
}

impl StockPrice {
    pub fn new(
        symbol: impl Into<String>,
        current_price: f64,
        previous_close: f64,
        volume: u64,
        market_cap: Option<f64>,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            current_price,
            previous_close,
            change_percent: change_percent(current_price, previous_close),
            volume,
            market_cap,
        }
    }
}

/// Fundamental metrics; coverage varies by ticker and provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    pub symbol: String,
    pub revenue: Option<f64>,
    pub net_income: Option<f64>,
    pub eps: Option<f64>,
    pub pe_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

impl FinancialData {
    /// Names of metrics the provider did not report
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("revenue", self.revenue),
            ("net_income", self.net_income),
            ("eps", self.eps),
            ("pe_ratio", self.pe_ratio),
            ("debt_to_equity", self.debt_to_equity),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.is_none().then_some(name))
        .collect()
    }
}

/// A news search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub content: String,
    pub published_date: Option<String>,
    pub score: Option<f64>,
}

/// Trade signal derived from price, MA50 and RSI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Neutral,
}

impl Signal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Indicator snapshot; not stored on the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSummary {
    pub current_price: f64,
    /// `MA_{period}` → value, absent when the window is not covered
    pub moving_averages: BTreeMap<String, Option<f64>>,
    pub rsi: f64,
    pub signal: Signal,
}

impl TechnicalSummary {
    pub fn ma(&self, period: usize) -> Option<f64> {
        self.moving_averages
            .get(&format!("MA_{period}"))
            .copied()
            .flatten()
    }
}

/// The final output of a research session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchReport {
    pub ticker: String,
    pub generated_at: DateTime<Utc>,
    pub summary: String,
    pub fundamental_analysis: String,
    pub technical_analysis: String,
    pub sentiment_analysis: String,
    pub recommendation: String,
    pub key_risks: Vec<String>,
    pub iteration_count: usize,
    /// Always within [0, 1]
    pub confidence: f64,
    pub data_gaps: Vec<String>,
}

impl ResearchReport {
    /// Clamp a confidence score into [0, 1]; NaN becomes 0
    pub fn clamp_confidence(value: f64) -> f64 {
        if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Equity Research: {}\n\n", self.ticker));
        out.push_str(&format!(
            "_Generated {} | iterations: {} | confidence: {:.0}%_\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M UTC"),
            self.iteration_count,
            self.confidence * 100.0
        ));

        for (title, body) in [
            ("Summary", &self.summary),
            ("Fundamental Analysis", &self.fundamental_analysis),
            ("Technical Analysis", &self.technical_analysis),
            ("Sentiment Analysis", &self.sentiment_analysis),
            ("Recommendation", &self.recommendation),
        ] {
            out.push_str(&format!("## {title}\n\n{}\n\n", body.trim()));
        }

        if !self.key_risks.is_empty() {
            out.push_str("## Key Risks\n\n");
            for risk in &self.key_risks {
                out.push_str(&format!("- {risk}\n"));
            }
            out.push('\n');
        }

        if !self.data_gaps.is_empty() {
            out.push_str("## Data Gaps\n\n");
            for gap in &self.data_gaps {
                out.push_str(&format!("- {gap}\n"));
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_percent_zero_guard() {
        assert_eq!(change_percent(123.45, 0.0), 0.0);
        assert_eq!(change_percent(0.0, 0.0), 0.0);
    }

    #[test]
    fn test_change_percent_rounds() {
        assert_eq!(change_percent(110.0, 100.0), 10.0);
        assert_eq!(change_percent(101.234, 100.0), 1.23);
        assert_eq!(change_percent(98.76, 100.0), -1.24);
        assert_eq!(change_percent(1.0, 3.0), -66.67);
    }

    #[test]
    fn test_stock_price_derives_change() {
        let price = StockPrice::new("AAPL", 190.0, 200.0, 1_000, Some(3.0e12));
        assert_eq!(price.change_percent, -5.0);
        assert_eq!(price.volume, 1_000);
    }

    #[test]
    fn test_signal_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(Signal::Neutral.to_string(), "NEUTRAL");
    }

    #[test]
    fn test_missing_fields() {
        let data = FinancialData {
            symbol: "TSLA".into(),
            revenue: Some(1.0),
            eps: Some(2.0),
            ..FinancialData::default()
        };
        assert_eq!(data.missing_fields(), vec!["net_income", "pe_ratio", "debt_to_equity"]);
    }

    #[test]
    fn test_confidence_clamp() {
        assert_eq!(ResearchReport::clamp_confidence(1.7), 1.0);
        assert_eq!(ResearchReport::clamp_confidence(-0.2), 0.0);
        assert_eq!(ResearchReport::clamp_confidence(f64::NAN), 0.0);
        assert_eq!(ResearchReport::clamp_confidence(0.42), 0.42);
    }
}
