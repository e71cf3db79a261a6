//! HTTP clients for market data and news providers

pub mod alpha_vantage;
pub mod tavily;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageClient;
pub use tavily::TavilyClient;
pub use yahoo::YahooProvider;
