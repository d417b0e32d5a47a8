//! Read-through room cache (§4.3.3, §9 design notes).
//!
//! Two independent caches: the public-room list (shared key, TTL 30s)
//! and a per-room single-entry cache. Every mutation that touches a
//! room's `participants` or inserts a message invalidates both the
//! room's entry and the shared public list, so the next reader never
//! observes stale data.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use collab_types::model::ChatRoom;

const PUBLIC_LIST_TTL: Duration = Duration::from_secs(30);

pub struct RoomCache {
    public_list: RwLock<Option<(Instant, Vec<ChatRoom>)>>,
    by_id: RwLock<HashMap<String, ChatRoom>>,
}

impl Default for RoomCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomCache {
    pub fn new() -> Self {
        Self {
            public_list: RwLock::new(None),
            by_id: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get_public_list(&self) -> Option<Vec<ChatRoom>> {
        let guard = self.public_list.read().await;
        match &*guard {
            Some((stored_at, rooms)) if stored_at.elapsed() < PUBLIC_LIST_TTL => {
                Some(rooms.clone())
            }
            _ => None,
        }
    }

    pub async fn set_public_list(&self, rooms: Vec<ChatRoom>) {
        *self.public_list.write().await = Some((Instant::now(), rooms));
    }

    pub async fn get_room(&self, room_id: &str) -> Option<ChatRoom> {
        self.by_id.read().await.get(room_id).cloned()
    }

    pub async fn put_room(&self, room: ChatRoom) {
        self.by_id.write().await.insert(room.id.clone(), room);
    }

    /// Invalidates the per-room entry and the shared public list cache.
    pub async fn invalidate_room(&self, room_id: &str) {
        self.by_id.write().await.remove(room_id);
        *self.public_list.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_types::model::{RoomKind, Visibility};
    use chrono::Utc;

    fn room(id: &str) -> ChatRoom {
        ChatRoom {
            id: id.to_string(),
            name: "r".to_string(),
            description: None,
            kind: RoomKind::Group,
            visibility: Visibility::Public,
            code: None,
            participants: vec![],
            created_by: "u1".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            video_room_id: None,
        }
    }

    #[tokio::test]
    async fn public_list_round_trips_within_ttl() {
        let cache = RoomCache::new();
        cache.set_public_list(vec![room("r1")]).await;
        let got = cache.get_public_list().await.unwrap();
        assert_eq!(got.len(), 1);
    }

    #[tokio::test]
    async fn invalidate_clears_both_caches() {
        let cache = RoomCache::new();
        cache.set_public_list(vec![room("r1")]).await;
        cache.put_room(room("r1")).await;
        cache.invalidate_room("r1").await;
        assert!(cache.get_public_list().await.is_none());
        assert!(cache.get_room("r1").await.is_none());
    }
}
