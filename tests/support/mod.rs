//! In-memory fakes behind the service traits, so flows and the evaluation
//! engine run without Mongo or a live market-data key.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::broadcast;

use tickalert::config::Settings;
use tickalert::error::{MarketDataError, StoreError};
use tickalert::models::{Alert, AlertCondition, OutboundMessage, Payload};
use tickalert::services::alert_store::AlertStore;
use tickalert::services::market_data::{Candle, MarketData, Series};
use tickalert::services::notifier::Notifier;
use tickalert::AppState;

// ---------------- store ----------------

#[derive(Default)]
pub struct MemoryAlertStore {
    next: AtomicI64,
    alerts: Mutex<Vec<Alert>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn insert(
        &self,
        user_id: i64,
        ticker: &str,
        condition: AlertCondition,
    ) -> Result<Alert, StoreError> {
        let alert = Alert {
            id: self.next.fetch_add(1, Ordering::SeqCst) + 1,
            user_id,
            ticker: ticker.to_string(),
            condition,
            created_at: Utc::now().timestamp(),
        };
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(alert)
    }

    async fn remove(&self, alert_id: i64) -> Result<(), StoreError> {
        let mut alerts = self.alerts.lock().unwrap();
        let before = alerts.len();
        alerts.retain(|a| a.id != alert_id);
        if alerts.len() == before {
            return Err(StoreError::NotFound(alert_id));
        }
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<Alert>, StoreError> {
        Ok(self.alerts.lock().unwrap().clone())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Alert>, StoreError> {
        Ok(self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }
}

// ---------------- market data ----------------

#[derive(Default)]
pub struct MockMarket {
    pub batch: HashMap<String, Series>,
    pub daily: HashMap<String, Series>,
    pub sma: HashMap<String, f64>,
    pub fail_batch: bool,
}

#[async_trait]
impl MarketData for MockMarket {
    async fn fetch_batch(
        &self,
        tickers: &BTreeSet<String>,
    ) -> Result<HashMap<String, Series>, MarketDataError> {
        if self.fail_batch {
            return Err(MarketDataError::BatchFailed);
        }
        Ok(tickers
            .iter()
            .filter_map(|t| self.batch.get(t).map(|s| (t.clone(), s.clone())))
            .collect())
    }

    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series, MarketDataError> {
        Ok(self
            .daily
            .get(ticker)
            .map(|s| {
                s.iter()
                    .filter(|c| c.date >= start && c.date <= end)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn compute_sma(
        &self,
        ticker: &str,
        _period: u32,
    ) -> Result<Option<f64>, MarketDataError> {
        Ok(self.sma.get(ticker).copied())
    }
}

// ---------------- notifier ----------------

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<OutboundMessage>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// All plain/actioned text payloads, in send order.
    pub fn texts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m.payload {
                Payload::Text { text } => Some(text),
                Payload::TextWithActions { text, .. } => Some(text),
                Payload::Image { .. } => None,
            })
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, user_id: i64, text: &str) {
        self.sent.lock().unwrap().push(OutboundMessage {
            user_id,
            payload: Payload::Text {
                text: text.to_string(),
            },
        });
    }

    async fn send_text_with_actions(
        &self,
        user_id: i64,
        text: &str,
        actions: Vec<tickalert::models::Action>,
    ) {
        self.sent.lock().unwrap().push(OutboundMessage {
            user_id,
            payload: Payload::TextWithActions {
                text: text.to_string(),
                actions,
            },
        });
    }

    async fn send_image(&self, user_id: i64, image: Vec<u8>, caption: &str) {
        self.sent.lock().unwrap().push(OutboundMessage {
            user_id,
            payload: Payload::image(&image, caption),
        });
    }
}

// ---------------- state wiring ----------------

pub fn test_settings() -> Settings {
    Settings {
        mongodb_uri: "mongodb://localhost:27017".to_string(),
        mongodb_db: "tickalert_test".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        finnhub_api_key: String::new(),
        poll_interval_secs: 60,
    }
}

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryAlertStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn test_state(market: MockMarket) -> TestHarness {
    let store = Arc::new(MemoryAlertStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let (events_tx, _events_rx) = broadcast::channel(64);

    let state = AppState::new(
        test_settings(),
        store.clone(),
        Arc::new(market),
        notifier.clone(),
        events_tx,
    );

    TestHarness {
        state,
        store,
        notifier,
    }
}

// ---------------- data helpers ----------------

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn flat_candle(date: NaiveDate, close: f64) -> Candle {
    Candle {
        date,
        open: close,
        high: close,
        low: close,
        close,
    }
}

pub fn candle(date: NaiveDate, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        date,
        open: close,
        high,
        low,
        close,
    }
}
