//! HTTP surface (§6): the three `GET /api/video/...` endpoints, mounted
//! here at their post-gateway-prefix-strip paths, plus `GET /video/ws`
//! (as `/ws`): `State` extraction, a typed error, a JSON envelope response.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use collab_types::ApiResponse;
use serde::Serialize;

use crate::error::HttpError;
use crate::state::AppState;
use crate::ws::ws_handler;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/participants", get(list_participants))
        .route(
            "/rooms/{room_id}/participants/{user_id}/screen-sharing",
            get(get_screen_sharing),
        )
        .with_state(state)
}

async fn get_room(State(state): State<AppState>, Path(room_id): Path<String>) -> impl IntoResponse {
    match state.engine.get_room(&room_id).await {
        Ok(room) => Json(ApiResponse::ok(room)).into_response(),
        Err(e) => HttpError(e).into_response(),
    }
}

async fn list_participants(State(state): State<AppState>, Path(room_id): Path<String>) -> impl IntoResponse {
    match state.engine.list_participants(&room_id).await {
        Ok(participants) => Json(ApiResponse::ok(participants)).into_response(),
        Err(e) => HttpError(e).into_response(),
    }
}

#[derive(Debug, Serialize)]
struct ScreenSharingState {
    user_id: String,
    screen_sharing: bool,
    video_enabled: bool,
    audio_enabled: bool,
}

async fn get_screen_sharing(
    State(state): State<AppState>,
    Path((room_id, user_id)): Path<(String, String)>,
) -> impl IntoResponse {
    match state.engine.screen_sharing_state(&room_id, &user_id).await {
        Ok((screen_sharing, video_enabled, audio_enabled)) => Json(ApiResponse::ok(ScreenSharingState {
            user_id,
            screen_sharing,
            video_enabled,
            audio_enabled,
        }))
        .into_response(),
        Err(e) => HttpError(e).into_response(),
    }
}
