use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::MarketDataError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

pub type Series = Vec<Candle>;

pub fn last_close(series: &Series) -> Option<f64> {
    series.last().map(|c| c.close)
}

/// The slice of the market-data gateway this service consumes.
///
/// `fetch_batch` is one logical call for the whole ticker set; tickers the
/// gateway could not serve are simply absent from the result map. The batch
/// as a whole errors only when nothing could be fetched at all.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Recent intraday series per ticker; the last close is "current price".
    async fn fetch_batch(
        &self,
        tickers: &BTreeSet<String>,
    ) -> Result<HashMap<String, Series>, MarketDataError>;

    /// Daily candles over `[start, end]` inclusive.
    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, MarketDataError>;

    /// Simple moving average of the last `period` daily closes.
    /// `Ok(None)` when there is not enough history.
    async fn compute_sma(&self, ticker: &str, period: u32)
        -> Result<Option<f64>, MarketDataError>;
}
