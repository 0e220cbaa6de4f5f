use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::MarketDataError;
use crate::services::market_data::{Candle, MarketData, Series};

const BASE_URL: &str = "https://finnhub.io/api/v1";

// How far back the intraday batch looks; wide enough to cover a weekend so
// the last close is still meaningful right after open.
const INTRADAY_LOOKBACK_DAYS: i64 = 3;

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(api_key: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
        }
    }

    fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    async fn candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> Result<CandleResponse, MarketDataError> {
        if !self.has_key() {
            return Err(MarketDataError::MissingApiKey);
        }

        let url = format!("{BASE_URL}/stock/candle");
        let res = self
            .http
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("resolution", resolution),
                ("from", &from.to_string()),
                ("to", &to.to_string()),
                ("token", &self.api_key),
            ])
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(MarketDataError::Rejected { status, body });
        }

        Ok(res.json::<CandleResponse>().await?)
    }

    async fn intraday(&self, symbol: &str) -> Result<Series, MarketDataError> {
        let now = Utc::now();
        let from = (now - Duration::days(INTRADAY_LOOKBACK_DAYS)).timestamp();
        let resp = self.candles(symbol, "5", from, now.timestamp()).await?;
        Ok(resp.into_series())
    }

    async fn daily(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, MarketDataError> {
        let from = start
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();
        let to = end
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc().timestamp())
            .unwrap_or_default();

        let resp = self.candles(symbol, "D", from, to).await?;
        Ok(resp.into_series())
    }
}

#[async_trait]
impl MarketData for FinnhubClient {
    async fn fetch_batch(
        &self,
        tickers: &BTreeSet<String>,
    ) -> Result<HashMap<String, Series>, MarketDataError> {
        let futures = tickers.iter().map(|ticker| {
            let ticker = ticker.clone();
            async move {
                let res = self.intraday(&ticker).await;
                (ticker, res)
            }
        });

        let mut out: HashMap<String, Series> = HashMap::new();
        let mut failures = 0usize;

        for (ticker, res) in futures_util::future::join_all(futures).await {
            match res {
                Ok(series) if !series.is_empty() => {
                    out.insert(ticker, series);
                }
                Ok(_) => {
                    tracing::warn!("no intraday data for {ticker}");
                }
                Err(e) => {
                    tracing::warn!("intraday fetch failed for {ticker}: {e}");
                    failures += 1;
                }
            }
        }

        // Individual gaps are fine; a batch where nothing came back is not.
        if !tickers.is_empty() && failures == tickers.len() {
            return Err(MarketDataError::BatchFailed);
        }

        Ok(out)
    }

    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, MarketDataError> {
        self.daily(ticker, start, end).await
    }

    async fn compute_sma(
        &self,
        ticker: &str,
        period: u32,
    ) -> Result<Option<f64>, MarketDataError> {
        let today = Utc::now().date_naive();

        // Calendar window of period*3 days usually holds `period` trading
        // days; fall back to a wider window before giving up.
        for window in [i64::from(period) * 3, i64::from(period) * 5] {
            let series = self.daily(ticker, today - Duration::days(window), today).await?;
            if series.len() >= period as usize {
                let closes: Vec<f64> = series.iter().map(|c| c.close).collect();
                let tail = &closes[closes.len() - period as usize..];
                return Ok(Some(tail.iter().sum::<f64>() / period as f64));
            }
        }

        Ok(None)
    }
}

#[derive(Debug, Deserialize)]
pub struct CandleResponse {
    // "ok" or "no_data"
    pub s: String,

    #[serde(default)]
    pub t: Vec<i64>,
    #[serde(default)]
    pub o: Vec<f64>,
    #[serde(default)]
    pub h: Vec<f64>,
    #[serde(default)]
    pub l: Vec<f64>,
    #[serde(default)]
    pub c: Vec<f64>,
}

impl CandleResponse {
    fn into_series(self) -> Series {
        if self.s != "ok" {
            return Vec::new();
        }

        self.t
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = DateTime::from_timestamp(ts, 0)?.date_naive();
                Some(Candle {
                    date,
                    open: *self.o.get(i)?,
                    high: *self.h.get(i)?,
                    low: *self.l.get(i)?,
                    close: *self.c.get(i)?,
                })
            })
            .collect()
    }
}
