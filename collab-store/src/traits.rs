//! The `Store` capability injected into both engines.

use crate::error::StoreError;
use async_trait::async_trait;
use collab_types::model::{ChatMessage, ChatRoom, MessageKind, VideoParticipant, VideoRoom};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewChatRoom {
    pub name: String,
    pub description: Option<String>,
    pub kind: collab_types::model::RoomKind,
    pub visibility: collab_types::model::Visibility,
    pub code: Option<String>,
    pub participants: Vec<String>,
    pub created_by: String,
    pub video_room_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewChatMessage {
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: Option<String>,
    pub sender_avatar: Option<String>,
    pub content: String,
    pub kind: MessageKind,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct NewVideoRoom {
    pub name: String,
    pub description: Option<String>,
    pub host_id: String,
    pub max_participants: u32,
    pub code: String,
    pub chat_room_id: Option<String>,
    pub chat_room_code: Option<String>,
}

/// A strongly consistent document database with server-generated ids,
/// server timestamps, atomic array add/remove and
/// equality/array-contains/order-by queries (§2 row B).
///
/// Every method may suspend (§5): the caller is responsible for applying
/// a deadline and the documented single retry on [`StoreError::Unavailable`].
#[async_trait]
pub trait Store: Send + Sync + 'static {
    // ---- chat rooms ----------------------------------------------------
    async fn create_chat_room(&self, room: NewChatRoom) -> StoreResult<ChatRoom>;
    async fn get_chat_room(&self, id: &str) -> StoreResult<Option<ChatRoom>>;
    async fn get_chat_room_by_code(&self, code: &str) -> StoreResult<Option<ChatRoom>>;
    async fn chat_room_code_exists(&self, code: &str) -> StoreResult<bool>;
    /// Public rooms ordered by `updated_at` descending. Implementations
    /// fall back to an unordered fetch + in-memory sort when the index
    /// is unavailable (§4.3.3); that fallback is internal and never
    /// surfaces as an error.
    async fn list_public_chat_rooms(&self) -> StoreResult<Vec<ChatRoom>>;
    /// Private rooms where `user_id` is a participant, same ordering.
    async fn list_private_chat_rooms_for_user(&self, user_id: &str) -> StoreResult<Vec<ChatRoom>>;
    /// Atomically adds `user_id` to `participants` if absent, bumps
    /// `updated_at`, and returns the up-to-date room.
    async fn add_chat_participant(&self, room_id: &str, user_id: &str) -> StoreResult<ChatRoom>;
    async fn touch_chat_room(&self, room_id: &str) -> StoreResult<()>;

    // ---- chat messages ---------------------------------------------------
    async fn insert_chat_message(&self, msg: NewChatMessage) -> StoreResult<ChatMessage>;
    /// Last `limit` messages ordered by `timestamp` descending, optionally
    /// starting strictly after `cursor` (a message id). Callers reverse
    /// the result to chronological order before delivery (§4.3.4).
    async fn get_chat_messages(
        &self,
        room_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> StoreResult<Vec<ChatMessage>>;

    // ---- video rooms -----------------------------------------------------
    async fn create_video_room(&self, room: NewVideoRoom) -> StoreResult<VideoRoom>;
    async fn get_video_room(&self, id: &str) -> StoreResult<Option<VideoRoom>>;
    async fn get_video_room_by_code(&self, code: &str) -> StoreResult<Option<VideoRoom>>;
    async fn video_room_code_exists(&self, code: &str) -> StoreResult<bool>;
    /// Compare-and-set add: fails with [`StoreError::Conflict`] if the
    /// room is already at capacity (§5 capacity enforcement).
    async fn add_video_participant(&self, room_id: &str, user_id: &str) -> StoreResult<VideoRoom>;
    async fn remove_video_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<VideoRoom>;
    async fn delete_video_room(&self, room_id: &str) -> StoreResult<()>;

    // ---- video participant records ---------------------------------------
    async fn upsert_video_participant(&self, participant: VideoParticipant) -> StoreResult<()>;
    async fn get_video_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<VideoParticipant>>;
    async fn list_video_participants(&self, room_id: &str) -> StoreResult<Vec<VideoParticipant>>;
    async fn remove_video_participant_record(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<()>;
    async fn delete_all_video_participants(&self, room_id: &str) -> StoreResult<()>;

    // ---- best-effort linkage ----------------------------------------------
    /// Best-effort add of `user_id` to a chat room's participants, used
    /// when a video room has a linked chat room (§4.4.2). Failure is
    /// non-fatal to the caller.
    async fn try_add_chat_participant(&self, room_id: &str, user_id: &str) {
        let _ = self.add_chat_participant(room_id, user_id).await;
    }
}
