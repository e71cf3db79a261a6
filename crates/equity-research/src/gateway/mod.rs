//! Provider-agnostic gateways used by the tools

pub mod market;
pub mod news;

pub use market::{HistoryWindow, MarketDataGateway, MarketDataProvider, TickerInfo};
pub use news::{NewsGateway, NewsSearchProvider};

#[cfg(test)]
pub use market::MockMarketDataProvider;
#[cfg(test)]
pub use news::MockNewsSearchProvider;
