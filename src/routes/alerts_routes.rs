use crate::{controllers::alerts_controller, AppState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/alerts/:user_id", get(alerts_controller::get_alerts))
        .route(
            "/alerts/:user_id/:id/delete",
            post(alerts_controller::post_delete_alert),
        )
}
