//! Duplex transport (§4.3 expansion): one `axum::extract::ws::WebSocket`
//! per session, a reader task decoding JSON frames into [`ChatClientEvent`]
//! and a writer task fed by an `mpsc::UnboundedSender<ChatServerEvent>`,
//! keeping transport concerns separate from session logic in [`crate::engine`].

use std::collections::HashMap;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use collab_types::events::{ChatClientEvent, ChatServerEvent};
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

    let auth_result = authenticate(&state, &mut stream, &query_pairs, &session_id).await;
    let user = match auth_result {
        Ok(user) => user,
        Err(err) => {
            let _ = send_one(&mut sink, &ChatServerEvent::Error(err)).await;
            return;
        }
    };

    tracing::info!(session_id = %session_id, user_id = %user.user_id, "chat session connected");

    let (tx, mut rx) = mpsc::unbounded_channel::<ChatServerEvent>();
    let (became_online, rooms) = state.engine.on_connect(&session_id, &user.user_id, tx.clone()).await;

    match rooms {
        Ok(rooms) => {
            let _ = tx.send(ChatServerEvent::RoomsList(rooms));
        }
        Err(e) => {
            let _ = tx.send(ChatServerEvent::Error(e));
        }
    }
    if became_online {
        state
            .engine
            .registry()
            .broadcast_all(
                ChatServerEvent::UserOnline {
                    user_id: user.user_id.clone(),
                },
                Some(&session_id),
            )
            .await;
    }

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

    let became_offline = state.engine.on_disconnect(&session_id, &user.user_id).await;
    if became_offline {
        state
            .engine
            .registry()
            .broadcast_all(
                ChatServerEvent::UserOffline {
                    user_id: user.user_id.clone(),
                },
                None,
            )
            .await;
    }

    writer_task.abort();
    tracing::info!(session_id = %session_id, user_id = %user.user_id, "chat session disconnected");
}

/// Resolves the handshake token: from the upgrade query string first,
/// falling back to the first frame's `auth.token` field (§4.2). That
/// first frame is consumed as the handshake and never dispatched as a
/// client event; a client sending `token` via the first frame must not
/// also pack a real event into it.
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
            false,
        )
        .await;
    }

    let first: Option<Value> = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        loop {
            match futures::StreamExt::next(stream).await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text).ok();
                }
                Some(Ok(_)) => continue,
                _ => return None,
            }
        }
    })
    .await
    .unwrap_or(None);

    collab_identity::session::authenticate_handshake(
        state.verifier.as_ref(),
        first.as_ref(),
        &[],
        session_id,
        false,
    )
    .await
}

async fn dispatch(
    state: &AppState,
    session_id: &str,
    user: &UserDescriptor,
    text: &str,
) {
    let event: ChatClientEvent = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            state
                .engine
                .registry()
                .send_to(
                    session_id,
                    ChatServerEvent::Error(CollabError::validation(format!(
                        "malformed event: {e}"
                    ))),
                )
                .await;
            return;
        }
    };

    let engine = &state.engine;
    let user_id = &user.user_id;

    match event {
        ChatClientEvent::RoomCreate(req) => {
            match engine
                .create_room(
                    user_id,
                    req.name,
                    req.description,
                    req.kind,
                    req.visibility,
                    req.participants,
                )
                .await
            {
                Ok(room) => {
                    engine.registry().send_to(session_id, ChatServerEvent::RoomCreated(room.clone())).await;
                    engine.broadcast_room_created(&room, session_id).await;
                }
                Err(e) => engine.registry().send_to(session_id, ChatServerEvent::Error(e)).await,
            }
        }
        ChatClientEvent::RoomJoin(req) => {
            match engine
                .join_room(user_id, session_id, &req.room_id, req.code.as_deref())
                .await
            {
                Ok(room) => engine.registry().send_to(session_id, ChatServerEvent::RoomJoined(room)).await,
                Err(e) => engine.registry().send_to(session_id, ChatServerEvent::Error(e)).await,
            }
        }
        ChatClientEvent::RoomJoinByCode(req) => {
            match engine.join_room_by_code(user_id, session_id, &req.code).await {
                Ok(room) => engine.registry().send_to(session_id, ChatServerEvent::RoomJoined(room)).await,
                Err(e) => engine.registry().send_to(session_id, ChatServerEvent::Error(e)).await,
            }
        }
        ChatClientEvent::RoomLeave(req) => {
            engine.leave_room(user_id, session_id, &req.room_id).await;
            engine
                .registry()
                .send_to(session_id, ChatServerEvent::RoomLeft { room_id: req.room_id })
                .await;
        }
        ChatClientEvent::RoomGet(req) => match engine.get_room(user_id, &req.room_id).await {
            Ok(room) => engine.registry().send_to(session_id, ChatServerEvent::RoomDetails(room)).await,
            Err(e) => engine.registry().send_to(session_id, ChatServerEvent::Error(e)).await,
        },
        ChatClientEvent::MessageSend(req) => {
            match engine
                .send_message(
                    user_id,
                    user.display_name.clone(),
                    user.avatar_url.clone(),
                    &req.room_id,
                    req.content,
                    req.kind,
                    req.metadata,
                )
                .await
            {
                Ok(_) => {}
                Err(e) => engine.registry().send_to(session_id, ChatServerEvent::Error(e)).await,
            }
        }
        ChatClientEvent::MessagesGet(req) => {
            match engine
                .get_messages(user_id, &req.room_id, req.limit, req.cursor.as_deref())
                .await
            {
                Ok(messages) => {
                    engine
                        .registry()
                        .send_to(
                            session_id,
                            ChatServerEvent::MessagesList {
                                room_id: req.room_id,
                                messages,
                            },
                        )
                        .await
                }
                Err(e) => engine.registry().send_to(session_id, ChatServerEvent::Error(e)).await,
            }
        }
    }
}

async fn send_one(
    sink: &mut (impl futures::Sink<Message, Error = axum::Error> + Unpin),
    event: &ChatServerEvent,
) -> Result<(), axum::Error> {
    let text = serde_json::to_string(event).unwrap_or_default();
    futures::SinkExt::send(sink, Message::Text(text.into())).await
}
