//! Yahoo Finance provider
//!
//! Prices and history come from the chart API via `yahoo_finance_api`.
//! Fundamentals come from the quoteSummary endpoint and are best-effort.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{instrument, warn};
use yahoo_finance_api as yahoo;

use crate::error::{ResearchError, Result};
use crate::gateway::{HistoryWindow, MarketDataProvider, TickerInfo};

const PROVIDER: &str = "yahoo";
const SUMMARY_BASE_URL: &str = "https://query2.finance.yahoo.com";
const SUMMARY_MODULES: &str = "price,summaryDetail,financialData,defaultKeyStatistics";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) equity-research";

/// Yahoo Finance market data provider (no API key required)
pub struct YahooProvider {
    client: Client,
    summary_base_url: String,
}

impl YahooProvider {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            summary_base_url: SUMMARY_BASE_URL.to_string(),
        })
    }

    /// Point the quoteSummary client elsewhere (mock servers)
    pub fn with_summary_base_url(mut self, url: impl Into<String>) -> Self {
        self.summary_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn connector() -> Result<yahoo::YahooConnector> {
        yahoo::YahooConnector::new().map_err(|e| classify_error(PROVIDER, &e.to_string()))
    }

    /// Last close, previous close and volume from a five-day daily chart
    async fn chart_quote(&self, ticker: &str) -> Result<TickerInfo> {
        let response = Self::connector()?
            .get_quote_range(ticker, "1d", "5d")
            .await
            .map_err(|e| classify_error(ticker, &e.to_string()))?;
        let quotes = response
            .quotes()
            .map_err(|e| classify_error(ticker, &e.to_string()))?;

        let Some(last) = quotes.last() else {
            return Err(ResearchError::unavailable(ticker, "empty chart response"));
        };
        let previous = quotes.len().checked_sub(2).and_then(|i| quotes.get(i));

        Ok(TickerInfo {
            regular_market_price: Some(last.close),
            previous_close: previous.map(|q| q.close),
            volume: Some(last.volume),
            ..TickerInfo::default()
        })
    }

    /// Fundamental and price fields from quoteSummary
    pub async fn quote_summary(&self, ticker: &str) -> Result<TickerInfo> {
        let url = format!("{}/v10/finance/quoteSummary/{ticker}", self.summary_base_url);
        let response = self
            .client
            .get(url)
            .query(&[("modules", SUMMARY_MODULES)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(ResearchError::unavailable(ticker, "quoteSummary not found"));
        }
        if !status.is_success() {
            return Err(ResearchError::provider(PROVIDER, format!("quoteSummary HTTP {status}")));
        }

        let body: SummaryResponse = response.json().await?;
        if let Some(error) = body.quote_summary.error {
            return Err(classify_error(ticker, &error.to_string()));
        }
        let Some(result) = body.quote_summary.result.into_iter().flatten().next() else {
            return Err(ResearchError::unavailable(ticker, "empty quoteSummary result"));
        };

        let price = result.price.unwrap_or_default();
        let detail = result.summary_detail.unwrap_or_default();
        let financial = result.financial_data.unwrap_or_default();
        let stats = result.default_key_statistics.unwrap_or_default();

        Ok(TickerInfo {
            current_price: financial.current_price.value(),
            regular_market_price: price.regular_market_price.value(),
            previous_close: detail.previous_close.value(),
            volume: detail.volume.value().map(|v| v as u64),
            market_cap: price.market_cap.value(),
            total_revenue: financial.total_revenue.value(),
            net_income_to_common: stats.net_income_to_common.value(),
            trailing_eps: stats.trailing_eps.value(),
            trailing_pe: detail.trailing_pe.value(),
            debt_to_equity: financial.debt_to_equity.value(),
        })
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn ticker_info(&self, ticker: &str) -> Result<TickerInfo> {
        let (chart, summary) = tokio::join!(self.chart_quote(ticker), self.quote_summary(ticker));

        match (chart, summary) {
            (Ok(chart), Ok(summary)) => Ok(merge(summary, chart)),
            (Ok(chart), Err(e)) => {
                warn!(ticker, error = %e, "quoteSummary unavailable, fundamentals left empty");
                Ok(chart)
            }
            (Err(e), Ok(summary)) => {
                warn!(ticker, error = %e, "Chart quote unavailable, using quoteSummary only");
                Ok(summary)
            }
            (Err(e), Err(_)) => Err(e),
        }
    }

    #[instrument(skip(self), fields(window = window.as_str()))]
    async fn daily_closes(&self, ticker: &str, window: HistoryWindow) -> Result<Vec<f64>> {
        let end = OffsetDateTime::now_utc();
        let start = end - time::Duration::days(window.days());

        let response = Self::connector()?
            .get_quote_history(ticker, start, end)
            .await
            .map_err(|e| classify_error(ticker, &e.to_string()))?;
        let quotes = response
            .quotes()
            .map_err(|e| classify_error(ticker, &e.to_string()))?;

        Ok(quotes.iter().map(|q| q.close).collect())
    }
}

/// Prefer summary fields, fill gaps from the chart
fn merge(summary: TickerInfo, chart: TickerInfo) -> TickerInfo {
    TickerInfo {
        regular_market_price: summary.regular_market_price.or(chart.regular_market_price),
        previous_close: summary.previous_close.or(chart.previous_close),
        volume: summary.volume.or(chart.volume),
        ..summary
    }
}

/// Yahoo reports unknown tickers through error text only
fn classify_error(symbol: &str, message: &str) -> ResearchError {
    let lower = message.to_lowercase();
    let missing = ["not found", "no data", "empty", "delisted", "no quotes"];
    if missing.iter().any(|m| lower.contains(m)) {
        ResearchError::unavailable(symbol, message)
    } else {
        ResearchError::provider(PROVIDER, message)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct SummaryEnvelope {
    result: Option<Vec<SummaryResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetail>,
    financial_data: Option<FinancialModule>,
    default_key_statistics: Option<KeyStatistics>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`, or `{}` when absent
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

trait RawField {
    fn value(&self) -> Option<f64>;
}

impl RawField for Option<RawValue> {
    fn value(&self) -> Option<f64> {
        self.as_ref().and_then(|v| v.raw).filter(|v| v.is_finite())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Option<RawValue>,
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    previous_close: Option<RawValue>,
    volume: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialModule {
    current_price: Option<RawValue>,
    total_revenue: Option<RawValue>,
    debt_to_equity: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    net_income_to_common: Option<RawValue>,
    trailing_eps: Option<RawValue>,
}
