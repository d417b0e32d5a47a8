//! Duplex transport (§4.4 expansion), the same split-socket /
//! reader-task / writer-task shape as `chat_engine::ws`. The handshake
//! additionally accepts no credential at all (§4.4.1 admission
//! exception): an anonymous descriptor is synthesized instead of
//! failing.

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use collab_types::events::{VideoClientEvent, VideoServerEvent};
use collab_types::{CollabError, UserDescriptor};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query))
}

async fn handle_socket(socket: WebSocket, state: AppState, query: HashMap<String, String>) {
    let session_id = uuid::Uuid::new_v4().to_string();
    let (mut sink, mut stream) = futures::StreamExt::split(socket);
    let query_pairs: Vec<(String, String)> = query.into_iter().collect();

    let user = match authenticate(&state, &mut stream, &query_pairs, &session_id).await {
        Ok(user) => user,
        Err(err) => {
            let _ = send_one(&mut sink, &VideoServerEvent::Error(err)).await;
            return;
        }
    };

    tracing::info!(session_id = %session_id, user_id = %user.user_id, "video session connected");

    let (tx, mut rx) = mpsc::unbounded_channel::<VideoServerEvent>();
    state.engine.on_connect(&session_id, &user.user_id, tx).await;

    let writer_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(text) => {
                    if futures::SinkExt::send(&mut sink, Message::Text(text.into()))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "failed to encode server event"),
            }
        }
    });

    while let Some(Ok(msg)) = futures::StreamExt::next(&mut stream).await {
        let Message::Text(text) = msg else { continue };
        dispatch(&state, &session_id, &user, &text).await;
    }

    state.engine.on_disconnect(&session_id).await;
    writer_task.abort();
    tracing::info!(session_id = %session_id, user_id = %user.user_id, "video session disconnected");
}

/// Same credential-resolution order as `chat_engine::ws::authenticate`
/// (query first, first-frame `auth.token` second), but admits no
/// credential at all as an anonymous session.
async fn authenticate(
    state: &AppState,
    stream: &mut (impl futures::Stream<Item = Result<Message, axum::Error>> + Unpin),
    query: &[(String, String)],
    session_id: &str,
) -> Result<UserDescriptor, CollabError> {
    if query.iter().any(|(k, _)| k == "token") {
        return collab_identity::session::authenticate_handshake(
            state.verifier.as_ref(),
            None,
            query,
            session_id,
            true,
        )
        .await;
    }

    let first: Option<Value> = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            match futures::StreamExt::next(stream).await {
                Some(Ok(Message::Text(text))) => return serde_json::from_str(&text).ok(),
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await
    .unwrap_or(None);

    collab_identity::session::authenticate_handshake(state.verifier.as_ref(), first.as_ref(), &[], session_id, true)
        .await
}

async fn dispatch(state: &AppState, session_id: &str, user: &UserDescriptor, text: &str) {
    let event: VideoClientEvent = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            state
                .engine
                .registry()
                .send_to(
                    session_id,
                    VideoServerEvent::Error(CollabError::validation(format!("malformed event: {e}"))),
                )
                .await;
            return;
        }
    };

    let engine = &state.engine;
    let user_id = &user.user_id;

    match event {
        VideoClientEvent::RoomCreate(req) => {
            match engine
                .create_room(user, session_id, req.name, req.description, req.with_chat_room)
                .await
            {
                Ok(room) => engine.registry().send_to(session_id, VideoServerEvent::RoomCreated(room)).await,
                Err(e) => engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await,
            }
        }
        VideoClientEvent::RoomJoin(req) => {
            match engine
                .join_room(user, session_id, req.room_id.as_deref(), req.code.as_deref())
                .await
            {
                Ok((room, participants)) => {
                    engine
                        .registry()
                        .send_to(session_id, VideoServerEvent::RoomJoined { room, participants })
                        .await
                }
                Err(e) => engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await,
            }
        }
        VideoClientEvent::RoomLeave(req) => {
            engine.leave_room(user_id, session_id, &req.room_id).await;
            engine
                .registry()
                .send_to(
                    session_id,
                    VideoServerEvent::RoomLeft {
                        room_id: req.room_id,
                        user_id: user_id.clone(),
                    },
                )
                .await;
        }
        VideoClientEvent::RoomEnd(req) => {
            // On success `video:room:ended` is broadcast to every
            // subscriber, the caller included, so nothing further to send.
            if let Err(e) = engine.end_room(user_id, &req.room_id).await {
                engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await;
            }
        }
        VideoClientEvent::Signal(req) => {
            if let Err(e) = engine.signal(user, session_id, req).await {
                engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await;
            }
        }
        VideoClientEvent::ToggleAudio(req) => {
            if let Err(e) = engine.toggle_audio(user_id, &req.room_id, req.enabled).await {
                engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await;
            }
        }
        VideoClientEvent::ToggleVideo(req) => {
            if let Err(e) = engine.toggle_video(user_id, &req.room_id, req.enabled).await {
                engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await;
            }
        }
        VideoClientEvent::ToggleScreen(req) => {
            if let Err(e) = engine.toggle_screen(user_id, session_id, &req.room_id, req.enabled).await {
                engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await;
            }
        }
        VideoClientEvent::ScreenStart(req) => {
            if let Err(e) = engine.screen_start(user_id, &req.room_id).await {
                engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await;
            }
        }
        VideoClientEvent::ScreenStop(req) => {
            if let Err(e) = engine.screen_stop(user_id, &req.room_id).await {
                engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await;
            }
        }
        VideoClientEvent::StreamReady(req) => {
            if let Err(e) = engine
                .stream_ready(user_id, &req.room_id, req.stream_id, req.screen_sharing)
                .await
            {
                engine.registry().send_to(session_id, VideoServerEvent::Error(e)).await;
            }
        }
    }
}

async fn send_one(
    sink: &mut (impl futures::Sink<Message, Error = axum::Error> + Unpin),
    event: &VideoServerEvent,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).unwrap_or_default();
    futures::SinkExt::send(sink, Message::Text(text.into())).await
}
