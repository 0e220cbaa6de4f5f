use std::collections::HashMap;

use crate::error::StoreError;
use crate::models::{Alert, AlertCondition};
use crate::AppState;

/// Create an alert: store first, then the mirror. The ordering means a crash
/// in between leaves a persisted alert that reappears on the next reload
/// rather than a phantom in-memory one.
pub async fn create_alert(
    state: &AppState,
    user_id: i64,
    ticker: &str,
    condition: AlertCondition,
) -> Result<Alert, StoreError> {
    let alert = state.store.insert(user_id, ticker, condition).await?;

    let mut mirror = state.alerts.write().await;
    mirror.entry(user_id).or_default().push(alert.clone());

    tracing::info!("alert {} created for user {}: {}", alert.id, user_id, alert.describe());
    Ok(alert)
}

/// Remove an alert from the store, then from the mirror. Same ordering and
/// the same accepted crash window as creation.
pub async fn remove_alert(state: &AppState, user_id: i64, alert_id: i64) -> Result<(), StoreError> {
    state.store.remove(alert_id).await?;

    let mut mirror = state.alerts.write().await;
    if let Some(list) = mirror.get_mut(&user_id) {
        list.retain(|a| a.id != alert_id);
        if list.is_empty() {
            mirror.remove(&user_id);
        }
    }

    tracing::info!("alert {} removed for user {}", alert_id, user_id);
    Ok(())
}

pub async fn list_alerts(state: &AppState, user_id: i64) -> Result<Vec<Alert>, StoreError> {
    state.store.list_for_user(user_id).await
}

/// Rebuild the in-memory mirror from the store. Run at startup; also the
/// self-heal path for any store/mirror drift left by a crash.
pub async fn rebuild_mirror(state: &AppState) -> Result<usize, StoreError> {
    let all = state.store.load_all().await?;
    let count = all.len();

    let mut grouped: HashMap<i64, Vec<Alert>> = HashMap::new();
    for alert in all {
        grouped.entry(alert.user_id).or_default().push(alert);
    }

    let mut mirror = state.alerts.write().await;
    *mirror = grouped;

    Ok(count)
}

/// Cloned view for evaluation; the evaluator must never iterate the live map.
pub async fn snapshot(state: &AppState) -> HashMap<i64, Vec<Alert>> {
    state.alerts.read().await.clone()
}
