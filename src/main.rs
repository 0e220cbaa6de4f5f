use std::net::SocketAddr;
use std::sync::Arc;

use mongodb::Client;
use tokio::sync::broadcast;

use tickalert::services::alert_store::MongoAlertStore;
use tickalert::services::finnhub::FinnhubClient;
use tickalert::services::notifier::BroadcastNotifier;
use tickalert::services::{alert_monitor, alerts_service, db_init};
use tickalert::{config, routes, AppState};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = config::load();

    // Mongo connection
    let client = Client::with_uri_str(&settings.mongodb_uri)
        .await
        .expect("Failed to connect to MongoDB");
    let db = client.database(&settings.mongodb_db);

    if let Err(e) = db_init::ensure_indexes(&db).await {
        tracing::warn!("failed to ensure indexes: {e}");
    }

    let (events_tx, _events_rx) = broadcast::channel(256);

    let state = AppState::new(
        settings.clone(),
        Arc::new(MongoAlertStore::new(db)),
        Arc::new(FinnhubClient::new(settings.finnhub_api_key.clone())),
        Arc::new(BroadcastNotifier::new(events_tx.clone())),
        events_tx,
    );

    // the in-memory mirror drives evaluation; rebuild it before the first tick
    match alerts_service::rebuild_mirror(&state).await {
        Ok(n) => tracing::info!("loaded {n} alerts from the store"),
        Err(e) => tracing::error!("failed to load alerts from the store: {e}"),
    }

    alert_monitor::spawn_alert_monitor(state.clone());

    let app = routes::app(state);

    let addr = SocketAddr::from((
        settings.host.parse::<std::net::IpAddr>().unwrap(),
        settings.port,
    ));
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
