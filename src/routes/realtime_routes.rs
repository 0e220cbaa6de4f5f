use crate::{events, AppState};
use axum::{routing::get, Router};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router.route("/events/:user_id", get(events::sse_events))
}
