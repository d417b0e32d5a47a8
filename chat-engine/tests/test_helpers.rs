//! Shared test helpers for chat-engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chat_engine::ChatEngine;
use collab_store::memory::MemoryStore;
use collab_types::events::ChatServerEvent;
use tokio::sync::mpsc;

pub fn new_engine() -> Arc<ChatEngine> {
    Arc::new(ChatEngine::new(Arc::new(MemoryStore::new())))
}

/// Connects a session and returns its outbound channel, already past the
/// initial `rooms:list` frame (and `user:online`, if this is the first
/// session for `user_id`).
pub async fn connect(
    engine: &ChatEngine,
    session_id: &str,
    user_id: &str,
) -> mpsc::UnboundedReceiver<ChatServerEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let (became_online, rooms) = engine.on_connect(session_id, user_id, tx.clone()).await;
    let rooms = rooms.expect("list_rooms should not fail for a fresh engine");
    // `ws::handle_socket` sends `rooms:list` itself right after
    // `on_connect`; reproduce that here since the engine only computes
    // the list and leaves delivery to the transport.
    let _ = tx.send(ChatServerEvent::RoomsList(rooms));
    if became_online {
        engine
            .registry()
            .broadcast_all(
                ChatServerEvent::UserOnline {
                    user_id: user_id.to_string(),
                },
                Some(session_id),
            )
            .await;
    }
    let first = recv(&mut rx).await;
    assert!(matches!(first, ChatServerEvent::RoomsList(_)));
    rx
}

/// Receives the next event within a short deadline, panicking on timeout.
pub async fn recv(rx: &mut mpsc::UnboundedReceiver<ChatServerEvent>) -> ChatServerEvent {
    tokio::time::timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed unexpectedly")
}

/// Asserts no event arrives within a short window.
pub async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<ChatServerEvent>) {
    let result = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(result.is_err(), "expected no event, got one");
}
