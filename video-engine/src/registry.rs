//! Session registry (§4.4, same "snapshot under lock, send outside it"
//! discipline as `chat-engine::registry`). Video has no cross-session
//! presence concept, so this owns only two maps: connected sessions and
//! per-room subscriber sets.

use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use collab_types::events::VideoServerEvent;

type Sender = tokio::sync::mpsc::UnboundedSender<VideoServerEvent>;

#[derive(Default)]
pub struct Registry {
    sessions: RwLock<HashMap<String, Sender>>,
    room_subscribers: RwLock<HashMap<String, HashSet<String>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn connect(&self, session_id: &str, sender: Sender) {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), sender);
    }

    /// Removes a session everywhere. Returns the set of room ids it was
    /// subscribed to, so the caller can run per-room leave logic.
    pub async fn disconnect(&self, session_id: &str) -> Vec<String> {
        self.sessions.write().await.remove(session_id);

        let mut rooms = self.room_subscribers.write().await;
        let mut subscribed = Vec::new();
        for (room_id, subs) in rooms.iter_mut() {
            if subs.remove(session_id) {
                subscribed.push(room_id.clone());
            }
        }
        rooms.retain(|_, subs| !subs.is_empty());
        subscribed
    }

    pub async fn subscribe(&self, room_id: &str, session_id: &str) {
        self.room_subscribers
            .write()
            .await
            .entry(room_id.to_string())
            .or_default()
            .insert(session_id.to_string());
    }

    pub async fn unsubscribe(&self, room_id: &str, session_id: &str) {
        let mut rooms = self.room_subscribers.write().await;
        if let Some(subs) = rooms.get_mut(room_id) {
            subs.remove(session_id);
            if subs.is_empty() {
                rooms.remove(room_id);
            }
        }
    }

    pub async fn send_to(&self, session_id: &str, event: VideoServerEvent) {
        let sessions = self.sessions.read().await;
        if let Some(sender) = sessions.get(session_id) {
            let _ = sender.send(event);
        }
    }

    /// Drops the subscriber set for `room_id` entirely (used on
    /// `video:room:end`, after the `video:room:ended` broadcast).
    pub async fn clear_room(&self, room_id: &str) {
        self.room_subscribers.write().await.remove(room_id);
    }

    pub async fn broadcast_room(&self, room_id: &str, event: VideoServerEvent, exclude: Option<&str>) {
        let targets: Vec<String> = {
            let rooms = self.room_subscribers.read().await;
            match rooms.get(room_id) {
                Some(subs) => subs
                    .iter()
                    .filter(|s| Some(s.as_str()) != exclude)
                    .cloned()
                    .collect(),
                None => return,
            }
        };
        let sessions = self.sessions.read().await;
        for session_id in targets {
            if let Some(sender) = sessions.get(&session_id) {
                let _ = sender.send(event.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disconnect_returns_subscribed_rooms_and_clears_them() {
        let registry = Registry::new();
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        registry.connect("s1", tx).await;
        registry.subscribe("room1", "s1").await;
        registry.subscribe("room2", "s1").await;

        let mut rooms = registry.disconnect("s1").await;
        rooms.sort();
        assert_eq!(rooms, vec!["room1".to_string(), "room2".to_string()]);

        let (tx2, mut rx2) = tokio::sync::mpsc::unbounded_channel();
        registry.connect("s2", tx2).await;
        registry.subscribe("room1", "s2").await;
        registry
            .broadcast_room(
                "room1",
                VideoServerEvent::RoomEnded {
                    room_id: "room1".into(),
                },
                None,
            )
            .await;
        assert!(rx2.try_recv().is_ok());
    }
}
