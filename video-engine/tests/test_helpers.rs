//! Shared test helpers for video-engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use collab_store::memory::MemoryStore;
use collab_types::events::VideoServerEvent;
use collab_types::UserDescriptor;
use tokio::sync::mpsc;
use video_engine::VideoEngine;

pub fn new_engine() -> Arc<VideoEngine> {
    Arc::new(VideoEngine::new(Arc::new(MemoryStore::new()), None))
}

pub fn new_engine_with_dedupe(window: Duration) -> Arc<VideoEngine> {
    Arc::new(VideoEngine::new(Arc::new(MemoryStore::new()), Some(window)))
}

pub fn user(id: &str) -> UserDescriptor {
    UserDescriptor {
        user_id: id.to_string(),
        display_name: Some(id.to_string()),
        email: None,
        avatar_url: None,
    }
}

pub async fn connect(engine: &VideoEngine, session_id: &str, user_id: &str) -> mpsc::UnboundedReceiver<VideoServerEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    engine.on_connect(session_id, user_id, tx).await;
    rx
}

pub async fn recv(rx: &mut mpsc::UnboundedReceiver<VideoServerEvent>) -> VideoServerEvent {
    tokio::time::timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("channel closed unexpectedly")
}

pub async fn assert_silent(rx: &mut mpsc::UnboundedReceiver<VideoServerEvent>) {
    let result = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
    assert!(result.is_err(), "expected no event, got one");
}
