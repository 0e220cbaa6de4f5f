use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use chrono_tz::America::New_York;

use crate::error::MarketDataError;
use crate::models::{Action, Alert, AlertCondition};
use crate::services::market_data::last_close;
use crate::services::{alerts_service, charts, trendline};
use crate::AppState;

const CHART_LOOKBACK_DAYS: i64 = 60;

pub fn spawn_alert_monitor(state: AppState) {
    tokio::spawn(async move {
        run(state).await;
    });
}

/// Two modes driven by one owning loop: sleep-until-open while the market is
/// closed, fixed-interval passes while it is open. One pass in flight at a
/// time; a slow pass delays the next one instead of overlapping it.
async fn run(state: AppState) {
    let poll = Duration::from_secs(state.settings.poll_interval_secs);

    loop {
        let now = Utc::now();

        if !state.clock.is_open(now) {
            let wait = state.clock.duration_until_open(now);
            tracing::info!(
                "market is closed; next evaluation in {}s",
                wait.num_seconds()
            );
            tokio::time::sleep(wait.to_std().unwrap_or(poll)).await;
            continue;
        }

        if let Err(e) = run_tick(&state).await {
            // transient: nothing was evaluated, retry on the next tick
            tracing::error!("evaluation pass skipped: {e}");
        }

        tokio::time::sleep(poll).await;
    }
}

/// One evaluation pass: snapshot the mirror, one batched fetch for every
/// distinct ticker, then each alert's predicate against its last close.
pub async fn run_tick(state: &AppState) -> Result<(), MarketDataError> {
    let snapshot = alerts_service::snapshot(state).await;

    let tickers: BTreeSet<String> = snapshot
        .values()
        .flatten()
        .map(|a| a.ticker.clone())
        .collect();

    if tickers.is_empty() {
        tracing::debug!("no active alerts to check");
        return Ok(());
    }

    tracing::info!("downloading data for {} tickers", tickers.len());
    let data = state.market.fetch_batch(&tickers).await?;

    let today = Utc::now().with_timezone(&New_York).date_naive();

    for (user_id, alerts) in snapshot {
        for alert in alerts {
            let Some(series) = data.get(&alert.ticker) else {
                tracing::warn!("no data available for {}, skipping", alert.ticker);
                continue;
            };
            let Some(price) = last_close(series) else {
                continue;
            };

            evaluate_alert(state, user_id, &alert, price, today).await;
        }
    }

    Ok(())
}

async fn evaluate_alert(
    state: &AppState,
    user_id: i64,
    alert: &Alert,
    price: f64,
    today: NaiveDate,
) {
    match &alert.condition {
        AlertCondition::Price {
            target_price,
            direction,
        } => {
            if direction.crossed(price, *target_price) {
                send_price_alert(state, user_id, alert, price, *target_price).await;
                // removal is deferred to the user's keep/remove answer
            }
        }

        AlertCondition::Sma { period, direction } => {
            let sma = match state.market.compute_sma(&alert.ticker, *period).await {
                Ok(Some(v)) => v,
                Ok(None) => {
                    tracing::warn!(
                        "not enough history for {} SMA({}), skipping",
                        alert.ticker,
                        period
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!("SMA lookup failed for {}: {e}", alert.ticker);
                    return;
                }
            };

            if direction.crossed(price, sma) {
                state
                    .notifier
                    .send_text(
                        user_id,
                        &format!(
                            "📈 SMA alert triggered!\n\n{}\nCurrent price: {:.2}\nSMA({}): {:.2}\nDirection: {}",
                            alert.ticker,
                            price,
                            period,
                            sma,
                            direction.as_str()
                        ),
                    )
                    .await;
                send_alert_chart(state, user_id, alert).await;
                remove_triggered(state, user_id, alert.id).await;
            }
        }

        AlertCondition::CustomLine {
            date1,
            price1,
            date2,
            price2,
            threshold,
        } => {
            let projected = trendline::project(*date1, *price1, *date2, *price2, today);
            // boundary is inclusive
            if (price - projected).abs() <= *threshold {
                state
                    .notifier
                    .send_text(
                        user_id,
                        &format!(
                            "📊 Trend line alert triggered!\n\n{}\nCurrent price: {:.2}\nProjected price: {:.2}\n(Threshold: ±{})",
                            alert.ticker, price, projected, threshold
                        ),
                    )
                    .await;
                send_alert_chart(state, user_id, alert).await;
                remove_triggered(state, user_id, alert.id).await;
            }
        }
    }
}

async fn send_price_alert(
    state: &AppState,
    user_id: i64,
    alert: &Alert,
    price: f64,
    target: f64,
) {
    let direction = match &alert.condition {
        AlertCondition::Price { direction, .. } => direction.as_str(),
        _ => "",
    };

    state
        .notifier
        .send_text_with_actions(
            user_id,
            &format!(
                "💰 Price alert triggered!\n\n{}\nCurrent price: {:.2}\nTarget price: {:.2}\nDirection: {}\n\nDo you want to remove this alert?",
                alert.ticker, price, target, direction
            ),
            vec![
                Action::new(format!("remove_{}", alert.id), "✅ Remove alert"),
                Action::new(format!("keep_{}", alert.id), "❌ Keep alert"),
            ],
        )
        .await;

    send_alert_chart(state, user_id, alert).await;
}

/// Dual-write removal for terminal triggers (SMA / trend line): store first,
/// mirror second. A crash in between self-heals on the next reload.
async fn remove_triggered(state: &AppState, user_id: i64, alert_id: i64) {
    if let Err(e) = alerts_service::remove_alert(state, user_id, alert_id).await {
        tracing::error!("failed to remove triggered alert {alert_id}: {e}");
    }
}

/// Best-effort chart for a triggered alert; failures never touch alert state.
pub async fn send_alert_chart(state: &AppState, user_id: i64, alert: &Alert) {
    let today = Utc::now().with_timezone(&New_York).date_naive();
    let start = today - ChronoDuration::days(CHART_LOOKBACK_DAYS);

    let series = match state.market.fetch_daily(&alert.ticker, start, today).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("chart data fetch failed for {}: {e}", alert.ticker);
            state
                .notifier
                .send_text(
                    user_id,
                    &format!("Could not generate a chart for the {} alert.", alert.ticker),
                )
                .await;
            return;
        }
    };

    match charts::render_alert_chart(&alert.ticker, &series, &alert.condition) {
        Ok(image) => {
            state
                .notifier
                .send_image(
                    user_id,
                    image,
                    &format!("Chart for your {} alert.", alert.ticker),
                )
                .await;
        }
        Err(e) => {
            tracing::warn!("chart render failed for {}: {e}", alert.ticker);
            state
                .notifier
                .send_text(
                    user_id,
                    &format!("Could not generate a chart for the {} alert.", alert.ticker),
                )
                .await;
        }
    }
}
