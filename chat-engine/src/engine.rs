//! Chat business logic (§4.3.3, §4.3.4), transport-agnostic. [`ws`](crate::ws)
//! decodes frames into [`ChatClientEvent`]s and calls into here; this
//! module owns no socket state, only the registry, the store handle and
//! the cache.

use std::sync::Arc;

use collab_store::{codes, NewChatMessage, NewChatRoom, Store};
use collab_types::events::ChatServerEvent;
use collab_types::model::{ChatMessage, ChatRoom, Visibility};
use collab_types::{CollabError, ErrorCode};

use crate::cache::RoomCache;
use crate::registry::Registry;

pub struct ChatEngine {
    store: Arc<dyn Store>,
    cache: RoomCache,
    registry: Registry,
}

impl ChatEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            cache: RoomCache::new(),
            registry: Registry::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Session connect (§4.3.1 steps 2–3). Returns the room list to send
    /// the joiner and whether `user:online` should be broadcast.
    pub async fn on_connect(
        &self,
        session_id: &str,
        user_id: &str,
        sender: tokio::sync::mpsc::UnboundedSender<ChatServerEvent>,
    ) -> (bool, Result<Vec<ChatRoom>, CollabError>) {
        let became_online = self.registry.connect(session_id, user_id, sender).await;
        let rooms = self.list_rooms(user_id).await;
        (became_online, rooms)
    }

    /// Session disconnect (§4.3.1 step 5). Returns whether `user:offline`
    /// should be broadcast.
    pub async fn on_disconnect(&self, session_id: &str, user_id: &str) -> bool {
        self.registry.disconnect(session_id, user_id).await
    }

    // ---- §4.3.3 room listing -------------------------------------------

    pub async fn list_rooms(&self, user_id: &str) -> Result<Vec<ChatRoom>, CollabError> {
        let public = match self.cache.get_public_list().await {
            Some(cached) => cached,
            None => {
                let mut rooms = self.store.list_public_chat_rooms().await?;
                rooms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                self.cache.set_public_list(rooms.clone()).await;
                rooms
            }
        };
        let private = self.store.list_private_chat_rooms_for_user(user_id).await?;

        let mut merged = public;
        for room in private {
            if !merged.iter().any(|r| r.id == room.id) {
                merged.push(room);
            }
        }
        merged.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(merged)
    }

    // ---- §4.3.4 membership and messages ----------------------------------

    pub async fn create_room(
        &self,
        creator_id: &str,
        name: String,
        description: Option<String>,
        kind: collab_types::model::RoomKind,
        visibility: Visibility,
        participants: Vec<String>,
    ) -> Result<ChatRoom, CollabError> {
        if name.trim().is_empty() {
            return Err(CollabError::validation("room name must not be empty"));
        }

        let code = match visibility {
            Visibility::Private => Some(codes::generate_unique_chat_code(self.store.as_ref()).await?),
            Visibility::Public => None,
        };

        let room = self
            .store
            .create_chat_room(NewChatRoom {
                name,
                description,
                kind,
                visibility,
                code,
                participants,
                created_by: creator_id.to_string(),
                video_room_id: None,
            })
            .await?;

        self.cache.invalidate_room(&room.id).await;
        Ok(room)
    }

    /// Broadcasts the creation to other sessions: full record to nobody
    /// but the creator (handled by the caller); a redacted copy to
    /// everyone else when the room is public.
    pub async fn broadcast_room_created(&self, room: &ChatRoom, exclude_session: &str) {
        if room.visibility == Visibility::Public {
            self.registry
                .broadcast_all(
                    ChatServerEvent::RoomCreated(room.redacted()),
                    Some(exclude_session),
                )
                .await;
        }
    }

    pub async fn join_room(
        &self,
        user_id: &str,
        session_id: &str,
        room_id: &str,
        code: Option<&str>,
    ) -> Result<ChatRoom, CollabError> {
        let room = self
            .store
            .get_chat_room(room_id)
            .await?
            .ok_or_else(|| CollabError::room_not_found(room_id))?;

        let already_member = room.participants.iter().any(|p| p == user_id);
        if room.visibility == Visibility::Private && !already_member {
            let supplied = code.ok_or_else(|| {
                CollabError::new(ErrorCode::CodeRequired, "a join code is required")
            })?;
            let normalized = codes::normalize_code(supplied)
                .ok_or_else(|| CollabError::new(ErrorCode::InvalidCode, "malformed room code"))?;
            let room_code = room.code.as_deref().unwrap_or_default().to_ascii_uppercase();
            if normalized != room_code {
                return Err(CollabError::new(ErrorCode::InvalidCode, "room code does not match"));
            }
        }

        let room = if already_member {
            room
        } else {
            let updated = self.store.add_chat_participant(room_id, user_id).await?;
            self.cache.invalidate_room(room_id).await;
            updated
        };

        let newly_subscribed = self.registry.subscribe(room_id, session_id).await;
        if newly_subscribed {
            self.registry
                .broadcast_room(
                    room_id,
                    ChatServerEvent::RoomUserJoined {
                        room_id: room_id.to_string(),
                        user_id: user_id.to_string(),
                    },
                    Some(session_id),
                )
                .await;
        }

        Ok(room)
    }

    pub async fn join_room_by_code(
        &self,
        user_id: &str,
        session_id: &str,
        code: &str,
    ) -> Result<ChatRoom, CollabError> {
        let normalized = codes::normalize_code(code)
            .ok_or_else(|| CollabError::new(ErrorCode::InvalidCodeFormat, "malformed room code"))?;
        let room = self
            .store
            .get_chat_room_by_code(&normalized)
            .await?
            .ok_or_else(|| CollabError::new(ErrorCode::InvalidCode, "no room with that code"))?;
        if room.visibility != Visibility::Private {
            return Err(CollabError::new(
                ErrorCode::NotPrivateRoom,
                "room is not private",
            ));
        }
        self.join_room(user_id, session_id, &room.id, Some(&normalized))
            .await
    }

    pub async fn leave_room(&self, user_id: &str, session_id: &str, room_id: &str) {
        self.registry.unsubscribe(room_id, session_id).await;
        self.registry
            .broadcast_room(
                room_id,
                ChatServerEvent::RoomUserLeft {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                },
                Some(session_id),
            )
            .await;
    }

    pub async fn send_message(
        &self,
        user_id: &str,
        sender_name: Option<String>,
        sender_avatar: Option<String>,
        room_id: &str,
        content: String,
        kind: collab_types::model::MessageKind,
        metadata: Option<serde_json::Value>,
    ) -> Result<ChatMessage, CollabError> {
        let room = self
            .store
            .get_chat_room(room_id)
            .await?
            .ok_or_else(|| CollabError::room_not_found(room_id))?;
        if !room.participants.iter().any(|p| p == user_id) {
            return Err(CollabError::new(
                ErrorCode::NotParticipant,
                "must be a participant to send messages",
            ));
        }

        let message = self
            .store
            .insert_chat_message(NewChatMessage {
                room_id: room_id.to_string(),
                sender_id: user_id.to_string(),
                sender_name,
                sender_avatar,
                content,
                kind,
                metadata,
            })
            .await?;
        self.store.touch_chat_room(room_id).await?;
        self.cache.invalidate_room(room_id).await;

        self.registry
            .broadcast_room(room_id, ChatServerEvent::MessageNew(message.clone()), None)
            .await;

        Ok(message)
    }

    pub async fn get_messages(
        &self,
        user_id: &str,
        room_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Vec<ChatMessage>, CollabError> {
        let room = self
            .store
            .get_chat_room(room_id)
            .await?
            .ok_or_else(|| CollabError::room_not_found(room_id))?;
        if !room.participants.iter().any(|p| p == user_id) {
            return Err(CollabError::new(
                ErrorCode::NotParticipant,
                "must be a participant to read messages",
            ));
        }

        let mut messages = self.store.get_chat_messages(room_id, limit, cursor).await?;
        messages.reverse(); // store returns newest-first; wire order is chronological
        Ok(messages)
    }

    pub async fn get_room(&self, user_id: &str, room_id: &str) -> Result<ChatRoom, CollabError> {
        if let Some(cached) = self.cache.get_room(room_id).await {
            return Self::project_room(cached, user_id);
        }
        let room = self
            .store
            .get_chat_room(room_id)
            .await?
            .ok_or_else(|| CollabError::room_not_found(room_id))?;
        self.cache.put_room(room.clone()).await;
        Self::project_room(room, user_id)
    }

    fn project_room(room: ChatRoom, user_id: &str) -> Result<ChatRoom, CollabError> {
        let is_participant = room.participants.iter().any(|p| p == user_id);
        if is_participant {
            return Ok(room);
        }
        match room.visibility {
            Visibility::Public => Ok(room.redacted()),
            Visibility::Private => Err(CollabError::new(
                ErrorCode::NotParticipant,
                "not a participant of this private room",
            )),
        }
    }
}
