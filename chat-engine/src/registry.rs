//! Session registry (§4.3.1, §9 "mutex-protected map with short critical
//! sections"). Owns three maps behind independent `RwLock`s: connected
//! sessions, per-user presence, and per-room subscriber sets. Broadcasts
//! snapshot the subscriber list under the lock, then send outside it.

use std::collections::{HashMap, HashSet};
use tokio::sync::{mpsc, RwLock};

use collab_types::events::ChatServerEvent;

type Sender = mpsc::UnboundedSender<ChatServerEvent>;

#[derive(Default)]
pub struct Registry {
    sessions: RwLock<HashMap<String, Sender>>,
    presence: RwLock<HashMap<String, HashSet<String>>>,
    room_subscribers: RwLock<HashMap<String, HashSet<String>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a session's outbound channel and records its presence.
    /// Returns `true` if this is the first session for `user_id` (the
    /// caller should broadcast `user:online`).
    pub async fn connect(&self, session_id: &str, user_id: &str, sender: Sender) -> bool {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), sender);
        let mut presence = self.presence.write().await;
        let set = presence.entry(user_id.to_string()).or_default();
        let was_empty = set.is_empty();
        set.insert(session_id.to_string());
        was_empty
    }

    /// Removes a session. Returns `true` if `user_id` has no more
    /// sessions (the caller should broadcast `user:offline`).
    pub async fn disconnect(&self, session_id: &str, user_id: &str) -> bool {
        self.sessions.write().await.remove(session_id);
        let mut presence = self.presence.write().await;
        let became_offline = if let Some(set) = presence.get_mut(user_id) {
            set.remove(session_id);
            let empty = set.is_empty();
            if empty {
                presence.remove(user_id);
            }
            empty
        } else {
            false
        };
        drop(presence);

        let mut rooms = self.room_subscribers.write().await;
        for subscribers in rooms.values_mut() {
            subscribers.remove(session_id);
        }
        rooms.retain(|_, subs| !subs.is_empty());

        became_offline
    }

    /// Adds `session_id` to `room_id`'s subscriber set. Returns `true` if
    /// it was not already subscribed (the caller should broadcast
    /// `room:user-joined`; a repeat `room:join` from the same session
    /// must not produce a duplicate).
    pub async fn subscribe(&self, room_id: &str, session_id: &str) -> bool {
        self.room_subscribers
            .write()
            .await
            .entry(room_id.to_string())
            .or_default()
            .insert(session_id.to_string())
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

    pub async fn send_to(&self, session_id: &str, event: ChatServerEvent) {
        let sessions = self.sessions.read().await;
        if let Some(sender) = sessions.get(session_id) {
            let _ = sender.send(event);
        }
    }

    /// Sends `event` to every session subscribed to `room_id`, optionally
    /// skipping `exclude`.
    pub async fn broadcast_room(
        &self,
        room_id: &str,
        event: ChatServerEvent,
        exclude: Option<&str>,
    ) {
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

    /// Sends `event` to every connected session, optionally skipping
    /// `exclude` (used for `user:online` / `user:offline`).
    pub async fn broadcast_all(&self, event: ChatServerEvent, exclude: Option<&str>) {
        let sessions = self.sessions.read().await;
        for (session_id, sender) in sessions.iter() {
            if Some(session_id.as_str()) == exclude {
                continue;
            }
            let _ = sender.send(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_session_for_user_reports_online_transition() {
        let registry = Registry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let first = registry.connect("s1", "u1", tx.clone()).await;
        assert!(first);
        let second = registry.connect("s2", "u1", tx).await;
        assert!(!second);
    }

    #[tokio::test]
    async fn disconnect_last_session_reports_offline_transition() {
        let registry = Registry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        registry.connect("s1", "u1", tx).await;
        let offline = registry.disconnect("s1", "u1").await;
        assert!(offline);
    }

    #[tokio::test]
    async fn disconnect_removes_room_subscriptions() {
        let registry = Registry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.connect("s1", "u1", tx).await;
        registry.subscribe("room1", "s1").await;
        registry.disconnect("s1", "u1").await;
        registry
            .broadcast_room("room1", ChatServerEvent::RoomLeft { room_id: "room1".into() }, None)
            .await;
        assert!(rx.try_recv().is_err());
    }
}
