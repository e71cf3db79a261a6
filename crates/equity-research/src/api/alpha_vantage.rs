//! Alpha Vantage API client

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{ResearchError, Result};
use crate::gateway::{HistoryWindow, MarketDataProvider, TickerInfo};

const PROVIDER: &str = "alpha_vantage";
const BASE_URL: &str = "https://www.alphavantage.co/query";

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Alpha Vantage client; every request waits on a per-minute rate limiter
#[derive(Debug, Clone)]
pub struct AlphaVantageClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl AlphaVantageClient {
    /// `rate_limit` is requests per minute; zero falls back to the free-tier 5
    pub fn new(api_key: impl Into<String>, rate_limit: u32, timeout: Duration) -> Result<Self> {
        let per_minute = NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::MIN.saturating_add(4));
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    async fn query(&self, symbol: &str, params: &[(&str, &str)]) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("symbol", symbol), ("apikey", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResearchError::provider(PROVIDER, format!("HTTP {status}")));
        }

        let data: Value = response.json().await?;
        if let Some(message) = data.get("Error Message").and_then(Value::as_str) {
            return Err(ResearchError::unavailable(symbol, message));
        }
        if data.get("Note").is_some() || data.get("Information").is_some() {
            return Err(ResearchError::RateLimited {
                provider: PROVIDER.to_string(),
            });
        }

        Ok(data)
    }

    /// GLOBAL_QUOTE: price, previous close and volume
    pub async fn global_quote(&self, symbol: &str) -> Result<TickerInfo> {
        let data = self.query(symbol, &[("function", "GLOBAL_QUOTE")]).await?;
        let quote = data
            .get("Global Quote")
            .and_then(Value::as_object)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| ResearchError::unavailable(symbol, "empty Global Quote"))?;

        Ok(TickerInfo {
            regular_market_price: quote.get("05. price").and_then(parse_number),
            previous_close: quote.get("08. previous close").and_then(parse_number),
            volume: quote
                .get("06. volume")
                .and_then(parse_number)
                .map(|v| v as u64),
            ..TickerInfo::default()
        })
    }

    /// OVERVIEW: company fundamentals
    pub async fn overview(&self, symbol: &str) -> Result<TickerInfo> {
        let data = self.query(symbol, &[("function", "OVERVIEW")]).await?;
        if data.as_object().is_none_or(serde_json::Map::is_empty) {
            return Err(ResearchError::unavailable(symbol, "empty company overview"));
        }

        let field = |name: &str| data.get(name).and_then(parse_number);
        let revenue = field("RevenueTTM");
        let margin = field("ProfitMargin");

        Ok(TickerInfo {
            market_cap: field("MarketCapitalization"),
            total_revenue: revenue,
            net_income_to_common: revenue.zip(margin).map(|(r, m)| r * m),
            trailing_eps: field("EPS"),
            trailing_pe: field("PERatio").or_else(|| field("TrailingPE")),
            ..TickerInfo::default()
        })
    }
}

#[async_trait]
impl MarketDataProvider for AlphaVantageClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    #[instrument(skip(self))]
    async fn ticker_info(&self, ticker: &str) -> Result<TickerInfo> {
        let quote = self.global_quote(ticker).await?;
        let overview = match self.overview(ticker).await {
            Ok(overview) => overview,
            Err(e @ ResearchError::RateLimited { .. }) => return Err(e),
            Err(e) => {
                debug!(error = %e, "Overview unavailable, fundamentals left empty");
                TickerInfo::default()
            }
        };

        Ok(TickerInfo {
            regular_market_price: quote.regular_market_price,
            previous_close: quote.previous_close,
            volume: quote.volume,
            ..overview
        })
    }

    #[instrument(skip(self), fields(window = window.as_str()))]
    async fn daily_closes(&self, ticker: &str, window: HistoryWindow) -> Result<Vec<f64>> {
        let output_size = match window {
            HistoryWindow::OneYear => "full",
            HistoryWindow::ThreeMonths => "compact",
        };
        let data = self
            .query(
                ticker,
                &[("function", "TIME_SERIES_DAILY"), ("outputsize", output_size)],
            )
            .await?;

        let series = data
            .get("Time Series (Daily)")
            .and_then(Value::as_object)
            .ok_or_else(|| ResearchError::unavailable(ticker, "no daily time series"))?;

        let cutoff = Utc::now().date_naive() - chrono::Duration::days(window.days());
        let mut points: Vec<(NaiveDate, f64)> = series
            .iter()
            .filter_map(|(date, bar)| {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
                let close = bar.get("4. close").and_then(parse_number)?;
                (date >= cutoff).then_some((date, close))
            })
            .collect();
        points.sort_by_key(|(date, _)| *date);

        Ok(points.into_iter().map(|(_, close)| close).collect())
    }
}

/// Alpha Vantage encodes numbers as strings and missing values as "None" or "-"
fn parse_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> AlphaVantageClient {
        AlphaVantageClient::new("demo", 600, Duration::from_secs(5))
            .unwrap()
            .with_base_url(format!("{}/query", server.uri()))
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number(&json!("189.5000")), Some(189.5));
        assert_eq!(parse_number(&json!("None")), None);
        assert_eq!(parse_number(&json!("-")), None);
        assert_eq!(parse_number(&json!(12)), Some(12.0));
    }

    #[tokio::test]
    async fn test_global_quote() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("function", "GLOBAL_QUOTE"))
            .and(query_param("symbol", "IBM"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Global Quote": {
                    "01. symbol": "IBM",
                    "05. price": "182.5200",
                    "06. volume": "3456789",
                    "08. previous close": "180.0000"
                }
            })))
            .mount(&server)
            .await;

        let info = client(&server).global_quote("IBM").await.unwrap();
        assert_eq!(info.price(), Some(182.52));
        assert_eq!(info.previous_close, Some(180.0));
        assert_eq!(info.volume, Some(3_456_789));
    }

    #[tokio::test]
    async fn test_empty_global_quote_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Global Quote": {}})))
            .mount(&server)
            .await;

        let err = client(&server).global_quote("UNKNOWN").await.unwrap_err();
        assert!(matches!(err, ResearchError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_error_message_and_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("symbol", "BAD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Error Message": "Invalid API call."
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("symbol", "IBM"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Note": "Thank you for using Alpha Vantage! Our standard API call frequency is 5 calls per minute."
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(matches!(
            client.global_quote("BAD").await.unwrap_err(),
            ResearchError::DataUnavailable { .. }
        ));
        assert!(matches!(
            client.global_quote("IBM").await.unwrap_err(),
            ResearchError::RateLimited { .. }
        ));
    }

    #[tokio::test]
    async fn test_overview_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("function", "OVERVIEW"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Symbol": "IBM",
                "MarketCapitalization": "167000000000",
                "RevenueTTM": "62000000000",
                "ProfitMargin": "0.1",
                "EPS": "8.14",
                "PERatio": "None"
            })))
            .mount(&server)
            .await;

        let info = client(&server).overview("IBM").await.unwrap();
        assert_eq!(info.market_cap, Some(1.67e11));
        assert_eq!(info.total_revenue, Some(6.2e10));
        assert_eq!(info.trailing_eps, Some(8.14));
        assert_eq!(info.trailing_pe, None);
        assert!((info.net_income_to_common.unwrap() - 6.2e9).abs() < 1.0);
    }

    #[tokio::test]
    async fn test_daily_closes_sorted_and_windowed() {
        let today = Utc::now().date_naive();
        let day = |n: i64| (today - chrono::Duration::days(n)).format("%Y-%m-%d").to_string();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("function", "TIME_SERIES_DAILY"))
            .and(query_param("outputsize", "compact"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Time Series (Daily)": {
                    day(1): {"4. close": "103.0"},
                    day(3): {"4. close": "101.0"},
                    day(2): {"4. close": "102.0"},
                    day(200): {"4. close": "50.0"}
                }
            })))
            .mount(&server)
            .await;

        let closes = client(&server)
            .daily_closes("IBM", HistoryWindow::ThreeMonths)
            .await
            .unwrap();
        assert_eq!(closes, vec![101.0, 102.0, 103.0]);
    }
}
