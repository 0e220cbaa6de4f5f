use std::{convert::Infallible, time::Duration};

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::stream::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::AppState;

/// Per-user notification stream. Everything the dispatcher publishes for
/// this user id is forwarded as a JSON payload event.
pub async fn sse_events(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();

    let stream = futures_util::stream::unfold(rx, move |mut rx| async move {
        loop {
            let evt = match rx.recv().await {
                Ok(msg) if msg.user_id == user_id => {
                    let data = serde_json::to_string(&msg.payload).unwrap_or_default();
                    Event::default().event("message").data(data)
                }
                // not ours; keep draining
                Ok(_) => continue,
                Err(RecvError::Lagged(_)) => Event::default().event("ping").data("lagged"),
                Err(RecvError::Closed) => Event::default().event("ping").data("closed"),
            };

            return Some((Ok(evt), rx));
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(20))
            .text("keep-alive"),
    )
}
