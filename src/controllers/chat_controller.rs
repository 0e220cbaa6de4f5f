use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{models::Reply, services::conversation, AppState};

#[derive(Deserialize)]
pub struct MessageBody {
    pub text: String,
}

#[derive(Deserialize)]
pub struct ActionBody {
    pub action: String,
}

// POST /chat/:user_id/message
pub async fn post_message(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(body): Json<MessageBody>,
) -> Json<Reply> {
    Json(conversation::handle_text(&state, user_id, &body.text).await)
}

// POST /chat/:user_id/action
pub async fn post_action(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(body): Json<ActionBody>,
) -> Json<Reply> {
    Json(conversation::handle_action(&state, user_id, &body.action).await)
}
