//! Library entrypoint for tickalert.
//!
//! This file exists mainly to make the service testable (integration tests
//! under `tests/` can import the app state, routers, controllers, services).

pub mod config;
pub mod error;
pub mod models;

pub mod services;

pub mod controllers;
pub mod events;
pub mod routes;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};

use crate::models::{Alert, OutboundMessage, Session};
use crate::services::alert_store::AlertStore;
use crate::services::market_clock::MarketClock;
use crate::services::market_data::MarketData;
use crate::services::notifier::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub store: Arc<dyn AlertStore>,
    pub market: Arc<dyn MarketData>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: MarketClock,

    // in-memory mirror of the store, grouped by user id; rebuilt at startup
    pub alerts: Arc<RwLock<HashMap<i64, Vec<Alert>>>>,

    // one in-progress authoring session per user
    pub sessions: Arc<Mutex<HashMap<i64, Session>>>,

    pub events_tx: broadcast::Sender<OutboundMessage>,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        store: Arc<dyn AlertStore>,
        market: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
        events_tx: broadcast::Sender<OutboundMessage>,
    ) -> Self {
        AppState {
            settings,
            store,
            market,
            notifier,
            clock: MarketClock::nyse(),
            alerts: Arc::new(RwLock::new(HashMap::new())),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            events_tx,
        }
    }
}
