use crate::{controllers::chat_controller, AppState};
use axum::{routing::post, Router};

pub fn add_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/chat/:user_id/message", post(chat_controller::post_message))
        .route("/chat/:user_id/action", post(chat_controller::post_action))
}
