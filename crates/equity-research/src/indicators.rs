//! Indicator engine: moving averages, RSI and the trade signal
//!
//! Values are returned unrounded; presentation layers round.

use std::collections::BTreeMap;
use ta::{Next, indicators::SimpleMovingAverage};

use crate::error::{ResearchError, Result};
use crate::model::{Signal, TechnicalSummary};

/// Periods reported in a technical summary
pub const DEFAULT_MA_PERIODS: [usize; 3] = [20, 50, 200];

/// RSI lookback used in a technical summary
pub const DEFAULT_RSI_PERIOD: usize = 14;

/// Label used for a moving-average period, e.g. `MA_50`
pub fn ma_label(period: usize) -> String {
    format!("MA_{period}")
}

/// Arithmetic mean of the last `period` values, `None` when the series is too short
fn trailing_mean(values: &[f64], period: usize) -> Result<Option<f64>> {
    if period == 0 || values.len() < period {
        return Ok(None);
    }

    let mut sma =
        SimpleMovingAverage::new(period).map_err(|e| ResearchError::Computation(e.to_string()))?;
    let mut mean = 0.0;
    for &value in &values[values.len() - period..] {
        mean = sma.next(value);
    }

    Ok(mean.is_finite().then_some(mean))
}

/// Simple moving average over the trailing window for each period.
///
/// A period longer than the series (or zero) maps to `None`.
pub fn moving_averages(closes: &[f64], periods: &[usize]) -> Result<BTreeMap<String, Option<f64>>> {
    if closes.is_empty() {
        return Err(ResearchError::Computation(
            "cannot compute moving averages of an empty series".to_string(),
        ));
    }

    periods
        .iter()
        .map(|&period| Ok((ma_label(period), trailing_mean(closes, period)?)))
        .collect()
}

/// Relative Strength Index over the last `period` price changes.
///
/// Gains and losses are averaged with a simple mean. The first observation
/// has no predecessor and counts as a zero change. When the average loss is
/// zero the index is 100.
pub fn rsi(closes: &[f64], period: usize) -> Result<f64> {
    if period == 0 {
        return Err(ResearchError::Computation("RSI period must be positive".to_string()));
    }
    if closes.is_empty() {
        return Err(ResearchError::Computation("cannot compute RSI of an empty series".to_string()));
    }
    if closes.len() < period {
        return Err(ResearchError::Computation(format!(
            "RSI({period}) needs at least {period} observations, got {}",
            closes.len()
        )));
    }

    let deltas: Vec<f64> = std::iter::once(0.0)
        .chain(closes.windows(2).map(|w| w[1] - w[0]))
        .collect();
    let gains: Vec<f64> = deltas.iter().map(|d| d.max(0.0)).collect();
    let losses: Vec<f64> = deltas.iter().map(|d| (-d).max(0.0)).collect();

    let avg_gain = trailing_mean(&gains, period)?.unwrap_or(0.0);
    let avg_loss = trailing_mean(&losses, period)?.unwrap_or(0.0);

    if avg_loss == 0.0 {
        return Ok(100.0);
    }

    let rs = avg_gain / avg_loss;
    Ok(100.0 - 100.0 / (1.0 + rs))
}

/// BUY when above MA50 and not overbought, SELL when below MA50 and not
/// oversold, NEUTRAL otherwise (including when MA50 is unknown or the price
/// is not positive).
pub fn classify_signal(price: f64, ma50: Option<f64>, rsi: f64) -> Signal {
    if price <= 0.0 || price.is_nan() {
        return Signal::Neutral;
    }

    match ma50 {
        Some(ma) if price > ma && rsi < 70.0 => Signal::Buy,
        Some(ma) if price < ma && rsi > 30.0 => Signal::Sell,
        _ => Signal::Neutral,
    }
}

/// Build a technical summary from a one-year and a three-month close series
pub fn summarize(price: f64, closes_1y: &[f64], closes_3mo: &[f64]) -> Result<TechnicalSummary> {
    let moving_averages = moving_averages(closes_1y, &DEFAULT_MA_PERIODS)?;
    let rsi = rsi(closes_3mo, DEFAULT_RSI_PERIOD)?;
    let ma50 = moving_averages.get(&ma_label(50)).copied().flatten();

    Ok(TechnicalSummary {
        current_price: price,
        signal: classify_signal(price, ma50, rsi),
        moving_averages,
        rsi,
    })
}
