mod support;

use support::{day, flat_candle, test_state, MockMarket};
use tickalert::models::{AlertCondition, Direction, Payload};
use tickalert::services::alert_store::AlertStore;
use tickalert::services::{alert_monitor, alerts_service};
use tickalert::AppState;

const USER: i64 = 1;

async fn seed(state: &AppState, ticker: &str, condition: AlertCondition) -> i64 {
    alerts_service::create_alert(state, USER, ticker, condition)
        .await
        .unwrap()
        .id
}

fn price_above(target: f64) -> AlertCondition {
    AlertCondition::Price {
        target_price: target,
        direction: Direction::Above,
    }
}

/// A line anchored on a single date projects to `price2` on any day, which
/// keeps these tests independent of the wall-clock date.
fn flat_line(level: f64, threshold: f64) -> AlertCondition {
    AlertCondition::CustomLine {
        date1: day(2026, 3, 2),
        price1: level,
        date2: day(2026, 3, 2),
        price2: level,
        threshold,
    }
}

fn market_with(ticker: &str, close: f64) -> MockMarket {
    let mut market = MockMarket::default();
    market
        .batch
        .insert(ticker.to_string(), vec![flat_candle(day(2026, 3, 2), close)]);
    market
}

#[tokio::test]
async fn price_trigger_notifies_with_actions_and_keeps_the_alert() {
    let h = test_state(market_with("AAPL", 155.0));
    let id = seed(&h.state, "AAPL", price_above(150.0)).await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    let sent = h.notifier.messages();
    let actioned = sent
        .iter()
        .find_map(|m| match &m.payload {
            Payload::TextWithActions { text, actions } => Some((text.clone(), actions.clone())),
            _ => None,
        })
        .expect("price trigger should carry keep/remove actions");

    assert!(actioned.0.contains("Price alert triggered"));
    assert!(actioned.1.iter().any(|a| a.id == format!("remove_{id}")));
    assert!(actioned.1.iter().any(|a| a.id == format!("keep_{id}")));

    // removal is deferred to the user's answer
    assert_eq!(h.store.count(), 1);
}

#[tokio::test]
async fn price_below_target_does_not_trigger() {
    let h = test_state(market_with("AAPL", 149.0));
    seed(&h.state, "AAPL", price_above(150.0)).await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.store.count(), 1);
}

#[tokio::test]
async fn sma_trigger_notifies_and_removes() {
    let mut market = market_with("TSLA", 105.0);
    market.sma.insert("TSLA".to_string(), 100.0);
    let h = test_state(market);
    seed(
        &h.state,
        "TSLA",
        AlertCondition::Sma {
            period: 20,
            direction: Direction::Above,
        },
    )
    .await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    assert!(h
        .notifier
        .texts()
        .iter()
        .any(|t| t.contains("SMA alert triggered")));
    assert_eq!(h.store.count(), 0);
    assert!(h.state.alerts.read().await.get(&USER).is_none());
}

#[tokio::test]
async fn sma_below_direction_does_not_trigger_at_105_over_100() {
    let mut market = market_with("TSLA", 105.0);
    market.sma.insert("TSLA".to_string(), 100.0);
    let h = test_state(market);
    seed(
        &h.state,
        "TSLA",
        AlertCondition::Sma {
            period: 20,
            direction: Direction::Below,
        },
    )
    .await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.store.count(), 1);
}

#[tokio::test]
async fn sma_without_enough_history_skips_the_alert() {
    // no SMA entry in the mock: compute_sma returns None
    let h = test_state(market_with("TSLA", 105.0));
    seed(
        &h.state,
        "TSLA",
        AlertCondition::Sma {
            period: 200,
            direction: Direction::Above,
        },
    )
    .await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.store.count(), 1);
}

#[tokio::test]
async fn custom_line_boundary_is_inclusive() {
    // projected 100.0, threshold 0.5, close exactly 100.5
    let h = test_state(market_with("NVDA", 100.5));
    seed(&h.state, "NVDA", flat_line(100.0, 0.5)).await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    assert!(h
        .notifier
        .texts()
        .iter()
        .any(|t| t.contains("Trend line alert triggered")));
    assert_eq!(h.store.count(), 0);
}

#[tokio::test]
async fn custom_line_outside_threshold_stays() {
    let h = test_state(market_with("NVDA", 100.51));
    seed(&h.state, "NVDA", flat_line(100.0, 0.5)).await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.store.count(), 1);
}

#[tokio::test]
async fn ticker_missing_from_batch_is_skipped_not_removed() {
    // batch has AAPL only; the GONE alert must survive untouched
    let h = test_state(market_with("AAPL", 100.0));
    seed(&h.state, "GONE", price_above(1.0)).await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.store.count(), 1);
}

#[tokio::test]
async fn batch_failure_skips_the_whole_pass() {
    let mut market = market_with("AAPL", 155.0);
    market.fail_batch = true;
    let h = test_state(market);
    seed(&h.state, "AAPL", price_above(150.0)).await;

    let res = alert_monitor::run_tick(&h.state).await;

    assert!(res.is_err());
    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.store.count(), 1);
}

#[tokio::test]
async fn empty_mirror_is_a_noop_even_when_fetch_would_fail() {
    let mut market = MockMarket::default();
    market.fail_batch = true;
    let h = test_state(market);

    // no alerts: the pass never reaches the gateway
    alert_monitor::run_tick(&h.state).await.unwrap();
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test]
async fn mixed_pass_removes_only_terminal_triggers() {
    // three alerts, two trigger; only the SMA one is terminal
    let mut market = MockMarket::default();
    market
        .batch
        .insert("AAPL".to_string(), vec![flat_candle(day(2026, 3, 2), 155.0)]);
    market
        .batch
        .insert("TSLA".to_string(), vec![flat_candle(day(2026, 3, 2), 105.0)]);
    market
        .batch
        .insert("NVDA".to_string(), vec![flat_candle(day(2026, 3, 2), 50.0)]);
    market.sma.insert("TSLA".to_string(), 100.0);
    let h = test_state(market);

    let price_id = seed(&h.state, "AAPL", price_above(150.0)).await;
    seed(
        &h.state,
        "TSLA",
        AlertCondition::Sma {
            period: 20,
            direction: Direction::Above,
        },
    )
    .await;
    let line_id = seed(&h.state, "NVDA", flat_line(100.0, 0.5)).await;

    alert_monitor::run_tick(&h.state).await.unwrap();

    // N=3, one terminal trigger: 2 remain, and they are the right two
    let left = h.store.load_all().await.unwrap();
    let ids: Vec<i64> = left.iter().map(|a| a.id).collect();
    assert_eq!(left.len(), 2);
    assert!(ids.contains(&price_id));
    assert!(ids.contains(&line_id));
}
