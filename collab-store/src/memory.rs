//! In-memory [`Store`] fake used by engine unit tests (no PostgreSQL
//! required). Mirrors the semantics of [`crate::pg::PgStore`] exactly,
//! including the compare-and-set capacity check and the chronological
//! cursor-based message pagination.

use crate::error::StoreError;
use crate::traits::{NewChatMessage, NewChatRoom, NewVideoRoom, Store, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use collab_types::model::{ChatMessage, ChatRoom, VideoParticipant, VideoRoom};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    rooms: HashMap<String, ChatRoom>,
    messages: HashMap<String, Vec<ChatMessage>>,
    video_rooms: HashMap<String, VideoRoom>,
    video_participants: HashMap<(String, String), VideoParticipant>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    seq: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            seq: AtomicU64::new(0),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let n = self.seq.fetch_add(1, Ordering::SeqCst);
        format!("{prefix}-{n}")
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_chat_room(&self, room: NewChatRoom) -> StoreResult<ChatRoom> {
        let id = self.next_id("room");
        let mut participants = room.participants;
        if !participants.iter().any(|p| p == &room.created_by) {
            participants.push(room.created_by.clone());
        }
        let now = Utc::now();
        let chat_room = ChatRoom {
            id: id.clone(),
            name: room.name,
            description: room.description,
            kind: room.kind,
            visibility: room.visibility,
            code: room.code,
            participants,
            created_by: room.created_by,
            created_at: now,
            updated_at: now,
            video_room_id: room.video_room_id,
        };
        self.inner
            .lock()
            .unwrap()
            .rooms
            .insert(id, chat_room.clone());
        Ok(chat_room)
    }

    async fn get_chat_room(&self, id: &str) -> StoreResult<Option<ChatRoom>> {
        Ok(self.inner.lock().unwrap().rooms.get(id).cloned())
    }

    async fn get_chat_room_by_code(&self, code: &str) -> StoreResult<Option<ChatRoom>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .rooms
            .values()
            .find(|r| r.code.as_deref() == Some(code))
            .cloned())
    }

    async fn chat_room_code_exists(&self, code: &str) -> StoreResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .rooms
            .values()
            .any(|r| r.code.as_deref() == Some(code)))
    }

    async fn list_public_chat_rooms(&self) -> StoreResult<Vec<ChatRoom>> {
        let inner = self.inner.lock().unwrap();
        let mut rooms: Vec<ChatRoom> = inner
            .rooms
            .values()
            .filter(|r| r.visibility == collab_types::model::Visibility::Public)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rooms)
    }

    async fn list_private_chat_rooms_for_user(&self, user_id: &str) -> StoreResult<Vec<ChatRoom>> {
        let inner = self.inner.lock().unwrap();
        let mut rooms: Vec<ChatRoom> = inner
            .rooms
            .values()
            .filter(|r| {
                r.visibility == collab_types::model::Visibility::Private
                    && r.participants.iter().any(|p| p == user_id)
            })
            .cloned()
            .collect();
        rooms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rooms)
    }

    async fn add_chat_participant(&self, room_id: &str, user_id: &str) -> StoreResult<ChatRoom> {
        let mut inner = self.inner.lock().unwrap();
        let room = inner.rooms.get_mut(room_id).ok_or(StoreError::NotFound)?;
        if !room.participants.iter().any(|p| p == user_id) {
            room.participants.push(user_id.to_string());
        }
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn touch_chat_room(&self, room_id: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let room = inner.rooms.get_mut(room_id).ok_or(StoreError::NotFound)?;
        room.updated_at = Utc::now();
        Ok(())
    }

    async fn insert_chat_message(&self, msg: NewChatMessage) -> StoreResult<ChatMessage> {
        let id = self.next_id("msg");
        let chat_message = ChatMessage {
            id,
            room_id: msg.room_id.clone(),
            sender_id: msg.sender_id,
            sender_name: msg.sender_name,
            sender_avatar: msg.sender_avatar,
            content: msg.content,
            kind: msg.kind,
            timestamp: Utc::now(),
            metadata: msg.metadata,
        };
        let mut inner = self.inner.lock().unwrap();
        inner
            .messages
            .entry(msg.room_id.clone())
            .or_default()
            .push(chat_message.clone());
        if let Some(room) = inner.rooms.get_mut(&msg.room_id) {
            room.updated_at = Utc::now();
        }
        Ok(chat_message)
    }

    async fn get_chat_messages(
        &self,
        room_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> StoreResult<Vec<ChatMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let inner = self.inner.lock().unwrap();
        let mut messages: Vec<ChatMessage> = inner
            .messages
            .get(room_id)
            .cloned()
            .unwrap_or_default();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if let Some(cursor_id) = cursor {
            if let Some(pos) = messages.iter().position(|m| m.id == cursor_id) {
                messages = messages.split_off(pos + 1);
            }
        }
        messages.truncate(limit as usize);
        Ok(messages)
    }

    async fn create_video_room(&self, room: NewVideoRoom) -> StoreResult<VideoRoom> {
        let id = self.next_id("vroom");
        let now = Utc::now();
        let video_room = VideoRoom {
            id: id.clone(),
            name: room.name,
            description: room.description,
            host_id: room.host_id.clone(),
            participants: vec![room.host_id],
            max_participants: room.max_participants,
            visibility: collab_types::model::Visibility::Public,
            code: room.code,
            chat_room_id: room.chat_room_id,
            chat_room_code: room.chat_room_code,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .lock()
            .unwrap()
            .video_rooms
            .insert(id, video_room.clone());
        Ok(video_room)
    }

    async fn get_video_room(&self, id: &str) -> StoreResult<Option<VideoRoom>> {
        Ok(self.inner.lock().unwrap().video_rooms.get(id).cloned())
    }

    async fn get_video_room_by_code(&self, code: &str) -> StoreResult<Option<VideoRoom>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .video_rooms
            .values()
            .find(|r| r.code == code)
            .cloned())
    }

    async fn video_room_code_exists(&self, code: &str) -> StoreResult<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .video_rooms
            .values()
            .any(|r| r.code == code))
    }

    async fn add_video_participant(&self, room_id: &str, user_id: &str) -> StoreResult<VideoRoom> {
        let mut inner = self.inner.lock().unwrap();
        let room = inner
            .video_rooms
            .get_mut(room_id)
            .ok_or(StoreError::NotFound)?;
        if !room.participants.iter().any(|p| p == user_id) {
            if room.is_full() {
                return Err(StoreError::Conflict("room full".into()));
            }
            room.participants.push(user_id.to_string());
        }
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn remove_video_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<VideoRoom> {
        let mut inner = self.inner.lock().unwrap();
        let room = inner
            .video_rooms
            .get_mut(room_id)
            .ok_or(StoreError::NotFound)?;
        room.participants.retain(|p| p != user_id);
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn delete_video_room(&self, room_id: &str) -> StoreResult<()> {
        self.inner.lock().unwrap().video_rooms.remove(room_id);
        Ok(())
    }

    async fn upsert_video_participant(&self, participant: VideoParticipant) -> StoreResult<()> {
        let key = (participant.room_id.clone(), participant.user_id.clone());
        self.inner.lock().unwrap().video_participants.insert(key, participant);
        Ok(())
    }

    async fn get_video_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<VideoParticipant>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .video_participants
            .get(&(room_id.to_string(), user_id.to_string()))
            .cloned())
    }

    async fn list_video_participants(&self, room_id: &str) -> StoreResult<Vec<VideoParticipant>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .video_participants
            .values()
            .filter(|p| p.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn remove_video_participant_record(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .video_participants
            .remove(&(room_id.to_string(), user_id.to_string()));
        Ok(())
    }

    async fn delete_all_video_participants(&self, room_id: &str) -> StoreResult<()> {
        self.inner
            .lock()
            .unwrap()
            .video_participants
            .retain(|(r, _), _| r != room_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use collab_types::model::{RoomKind, Visibility};

    fn new_room(created_by: &str) -> NewChatRoom {
        NewChatRoom {
            name: "General".into(),
            description: None,
            kind: RoomKind::Group,
            visibility: Visibility::Public,
            code: None,
            participants: vec![],
            created_by: created_by.to_string(),
            video_room_id: None,
        }
    }

    #[tokio::test]
    async fn creator_is_a_participant() {
        let store = MemoryStore::new();
        let room = store.create_chat_room(new_room("u1")).await.unwrap();
        assert!(room.participants.contains(&"u1".to_string()));
    }

    #[tokio::test]
    async fn join_is_idempotent() {
        let store = MemoryStore::new();
        let room = store.create_chat_room(new_room("u1")).await.unwrap();
        store.add_chat_participant(&room.id, "u2").await.unwrap();
        let room = store.add_chat_participant(&room.id, "u2").await.unwrap();
        assert_eq!(room.participants.iter().filter(|p| *p == "u2").count(), 1);
    }

    #[tokio::test]
    async fn messages_get_limit_zero_returns_empty() {
        let store = MemoryStore::new();
        let room = store.create_chat_room(new_room("u1")).await.unwrap();
        let msgs = store.get_chat_messages(&room.id, 0, None).await.unwrap();
        assert!(msgs.is_empty());
    }

    #[tokio::test]
    async fn video_capacity_is_enforced() {
        let store = MemoryStore::new();
        let room = store
            .create_video_room(NewVideoRoom {
                name: "r".into(),
                description: None,
                host_id: "host".into(),
                max_participants: 2,
                code: "ABCDEF".into(),
                chat_room_id: None,
                chat_room_code: None,
            })
            .await
            .unwrap();
        store.add_video_participant(&room.id, "p2").await.unwrap();
        let err = store.add_video_participant(&room.id, "p3").await;
        assert!(matches!(err, Err(StoreError::Conflict(_))));
    }
}
