//! HTTP surface: `GET /chat/ws` is what the gateway forwards
//! `/api/chat/*` upgrades to (after the gateway strips the prefix).

use axum::{routing::get, Router};

use crate::state::AppState;
use crate::ws::ws_handler;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}
