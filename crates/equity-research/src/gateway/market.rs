//! Market data gateway: quotes, fundamentals and technical summaries

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::api::{AlphaVantageClient, YahooProvider};
use crate::cache::ResponseCache;
use crate::config::{DataProvider, ResearchConfig};
use crate::error::{ResearchError, Result};
use crate::indicators;
use crate::model::{FinancialData, StockPrice, TechnicalSummary};

/// Raw ticker record as reported by a provider; any field may be missing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub current_price: Option<f64>,
    pub regular_market_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub volume: Option<u64>,
    pub market_cap: Option<f64>,
    pub total_revenue: Option<f64>,
    pub net_income_to_common: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub debt_to_equity: Option<f64>,
}

impl TickerInfo {
    /// Current price, falling back to the regular market price
    pub fn price(&self) -> Option<f64> {
        self.current_price.or(self.regular_market_price)
    }
}

/// Lookback window for daily close series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryWindow {
    OneYear,
    ThreeMonths,
}

impl HistoryWindow {
    pub fn days(self) -> i64 {
        match self {
            Self::OneYear => 365,
            Self::ThreeMonths => 90,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneYear => "1y",
            Self::ThreeMonths => "3mo",
        }
    }
}

/// A source of market data
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Quote and fundamental fields for `ticker`
    async fn ticker_info(&self, ticker: &str) -> Result<TickerInfo>;

    /// Daily closes in chronological order
    async fn daily_closes(&self, ticker: &str, window: HistoryWindow) -> Result<Vec<f64>>;
}

/// Cached front for a [`MarketDataProvider`]
#[derive(Clone)]
pub struct MarketDataGateway {
    provider: Arc<dyn MarketDataProvider>,
    info_cache: ResponseCache<TickerInfo>,
    history_cache: ResponseCache<Vec<f64>>,
}

impl MarketDataGateway {
    pub fn new(provider: Arc<dyn MarketDataProvider>, config: &ResearchConfig) -> Self {
        Self {
            provider,
            info_cache: ResponseCache::new(config.cache_ttl_quote),
            history_cache: ResponseCache::new(config.cache_ttl_history),
        }
    }

    /// Gateway over the provider selected in `config`
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let provider: Arc<dyn MarketDataProvider> = match config.market_provider {
            DataProvider::Yahoo => Arc::new(YahooProvider::new(config.request_timeout)?),
            DataProvider::AlphaVantage => {
                let key = config.alpha_vantage_api_key.clone().ok_or_else(|| {
                    ResearchError::Configuration("ALPHA_VANTAGE_API_KEY is not set".to_string())
                })?;
                Arc::new(AlphaVantageClient::new(
                    key,
                    config.alpha_vantage_rate_limit,
                    config.request_timeout,
                )?)
            }
        };
        Ok(Self::new(provider, config))
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    async fn ticker_info(&self, ticker: &str) -> Result<TickerInfo> {
        let provider = Arc::clone(&self.provider);
        self.info_cache
            .get_or_fetch(&format!("info:{ticker}"), || async move {
                provider.ticker_info(ticker).await
            })
            .await
    }

    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn quote(&self, ticker: &str) -> Result<StockPrice> {
        let info = self.ticker_info(ticker).await?;
        let price = info
            .price()
            .ok_or_else(|| ResearchError::unavailable(ticker, "no current price in quote record"))?;

        Ok(StockPrice::new(
            ticker,
            price,
            info.previous_close.unwrap_or(0.0),
            info.volume.unwrap_or(0),
            info.market_cap,
        ))
    }

    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn fundamentals(&self, ticker: &str) -> Result<FinancialData> {
        let info = self.ticker_info(ticker).await?;
        let data = FinancialData {
            symbol: ticker.to_string(),
            revenue: info.total_revenue,
            net_income: info.net_income_to_common,
            eps: info.trailing_eps,
            pe_ratio: info.trailing_pe,
            debt_to_equity: info.debt_to_equity,
        };

        if data.missing_fields().len() == 5 {
            return Err(ResearchError::unavailable(ticker, "no fundamental metrics reported"));
        }
        Ok(data)
    }

    #[instrument(skip(self), fields(provider = self.provider.name(), window = window.as_str()))]
    pub async fn daily_closes(&self, ticker: &str, window: HistoryWindow) -> Result<Vec<f64>> {
        let provider = Arc::clone(&self.provider);
        self.history_cache
            .get_or_fetch(&format!("history:{ticker}:{}", window.as_str()), || async move {
                provider.daily_closes(ticker, window).await
            })
            .await
    }

    /// MA20/50/200 over one year, RSI(14) over three months, plus the signal
    #[instrument(skip(self), fields(provider = self.provider.name()))]
    pub async fn technical_summary(&self, ticker: &str) -> Result<TechnicalSummary> {
        let closes_1y = self.daily_closes(ticker, HistoryWindow::OneYear).await?;
        let Some(&last_close) = closes_1y.last() else {
            return Err(ResearchError::unavailable(ticker, "no price history for the last year"));
        };

        let closes_3mo = self.daily_closes(ticker, HistoryWindow::ThreeMonths).await?;
        if closes_3mo.is_empty() {
            return Err(ResearchError::unavailable(ticker, "no price history for the last 3 months"));
        }

        let price = match self.quote(ticker).await {
            Ok(quote) => quote.current_price,
            Err(e) => {
                debug!(error = %e, "Quote unavailable, using last close");
                last_close
            }
        };

        indicators::summarize(price, &closes_1y, &closes_3mo)
    }
}
