//! PostgreSQL-backed [`Store`] implementation.
//!
//! Follows the query-module convention of `meeting-api/src/db/*.rs`: plain
//! `sqlx::query_as` against `#[derive(FromRow)]` rows, one function per
//! operation, no ORM.

use crate::error::StoreError;
use crate::traits::{NewChatMessage, NewChatRoom, NewVideoRoom, Store, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use collab_types::model::{
    ChatMessage, ChatRoom, MessageKind, RoomKind, VideoParticipant, VideoRoom, Visibility,
};
use sqlx::PgPool;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run pending migrations. Call once at startup.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn kind_to_str(kind: RoomKind) -> &'static str {
    match kind {
        RoomKind::Direct => "direct",
        RoomKind::Group => "group",
        RoomKind::Channel => "channel",
    }
}

fn kind_from_str(s: &str) -> RoomKind {
    match s {
        "direct" => RoomKind::Direct,
        "channel" => RoomKind::Channel,
        _ => RoomKind::Group,
    }
}

fn visibility_to_str(v: Visibility) -> &'static str {
    match v {
        Visibility::Public => "public",
        Visibility::Private => "private",
    }
}

fn visibility_from_str(s: &str) -> Visibility {
    if s == "private" {
        Visibility::Private
    } else {
        Visibility::Public
    }
}

fn message_kind_to_str(k: MessageKind) -> &'static str {
    match k {
        MessageKind::Text => "text",
        MessageKind::Image => "image",
        MessageKind::File => "file",
        MessageKind::System => "system",
    }
}

fn message_kind_from_str(s: &str) -> MessageKind {
    match s {
        "image" => MessageKind::Image,
        "file" => MessageKind::File,
        "system" => MessageKind::System,
        _ => MessageKind::Text,
    }
}

#[derive(sqlx::FromRow)]
struct RoomRow {
    id: String,
    name: String,
    description: Option<String>,
    kind: String,
    visibility: String,
    code: Option<String>,
    participants: Vec<String>,
    created_by: String,
    video_room_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RoomRow> for ChatRoom {
    fn from(r: RoomRow) -> Self {
        ChatRoom {
            id: r.id,
            name: r.name,
            description: r.description,
            kind: kind_from_str(&r.kind),
            visibility: visibility_from_str(&r.visibility),
            code: r.code,
            participants: r.participants,
            created_by: r.created_by,
            created_at: r.created_at,
            updated_at: r.updated_at,
            video_room_id: r.video_room_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    room_id: String,
    sender_id: String,
    sender_name: Option<String>,
    sender_avatar: Option<String>,
    content: String,
    kind: String,
    metadata: Option<serde_json::Value>,
    timestamp: DateTime<Utc>,
}

impl From<MessageRow> for ChatMessage {
    fn from(r: MessageRow) -> Self {
        ChatMessage {
            id: r.id,
            room_id: r.room_id,
            sender_id: r.sender_id,
            sender_name: r.sender_name,
            sender_avatar: r.sender_avatar,
            content: r.content,
            kind: message_kind_from_str(&r.kind),
            timestamp: r.timestamp,
            metadata: r.metadata,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VideoRoomRow {
    id: String,
    name: String,
    description: Option<String>,
    host_id: String,
    participants: Vec<String>,
    max_participants: i32,
    visibility: String,
    code: String,
    chat_room_id: Option<String>,
    chat_room_code: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<VideoRoomRow> for VideoRoom {
    fn from(r: VideoRoomRow) -> Self {
        VideoRoom {
            id: r.id,
            name: r.name,
            description: r.description,
            host_id: r.host_id,
            participants: r.participants,
            max_participants: r.max_participants.max(0) as u32,
            visibility: visibility_from_str(&r.visibility),
            code: r.code,
            chat_room_id: r.chat_room_id,
            chat_room_code: r.chat_room_code,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VideoParticipantRow {
    room_id: String,
    user_id: String,
    socket_id: String,
    display_name: Option<String>,
    email: Option<String>,
    audio_enabled: bool,
    video_enabled: bool,
    screen_sharing: bool,
    joined_at: DateTime<Utc>,
}

impl From<VideoParticipantRow> for VideoParticipant {
    fn from(r: VideoParticipantRow) -> Self {
        VideoParticipant {
            room_id: r.room_id,
            user_id: r.user_id,
            socket_id: r.socket_id,
            display_name: r.display_name,
            email: r.email,
            audio_enabled: r.audio_enabled,
            video_enabled: r.video_enabled,
            screen_sharing: r.screen_sharing,
            joined_at: r.joined_at,
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[async_trait]
impl Store for PgStore {
    async fn create_chat_room(&self, room: NewChatRoom) -> StoreResult<ChatRoom> {
        let id = new_id();
        let mut participants = room.participants;
        if !participants.iter().any(|p| p == &room.created_by) {
            participants.push(room.created_by.clone());
        }
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            INSERT INTO rooms (id, name, description, kind, visibility, code, participants, created_by, video_room_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, description, kind, visibility, code, participants, created_by, video_room_id, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(&room.name)
        .bind(&room.description)
        .bind(kind_to_str(room.kind))
        .bind(visibility_to_str(room.visibility))
        .bind(&room.code)
        .bind(&participants)
        .bind(&room.created_by)
        .bind(&room.video_room_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_chat_room(&self, id: &str) -> StoreResult<Option<ChatRoom>> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"SELECT id, name, description, kind, visibility, code, participants, created_by, video_room_id, created_at, updated_at
               FROM rooms WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn get_chat_room_by_code(&self, code: &str) -> StoreResult<Option<ChatRoom>> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"SELECT id, name, description, kind, visibility, code, participants, created_by, video_room_id, created_at, updated_at
               FROM rooms WHERE code = $1"#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn chat_room_code_exists(&self, code: &str) -> StoreResult<bool> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM rooms WHERE code = $1)")
            .bind(code)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }

    async fn list_public_chat_rooms(&self) -> StoreResult<Vec<ChatRoom>> {
        let result = sqlx::query_as::<_, RoomRow>(
            r#"SELECT id, name, description, kind, visibility, code, participants, created_by, video_room_id, created_at, updated_at
               FROM rooms WHERE visibility = 'public' ORDER BY updated_at DESC"#,
        )
        .fetch_all(&self.pool)
        .await;
        match result {
            Ok(rows) => Ok(rows.into_iter().map(Into::into).collect()),
            Err(_) => {
                // Index-missing fallback: unordered fetch, sort in memory (§4.3.3).
                tracing::warn!("falling back to unordered public-room scan");
                let rows = sqlx::query_as::<_, RoomRow>(
                    r#"SELECT id, name, description, kind, visibility, code, participants, created_by, video_room_id, created_at, updated_at
                       FROM rooms WHERE visibility = 'public'"#,
                )
                .fetch_all(&self.pool)
                .await?;
                let mut rooms: Vec<ChatRoom> = rows.into_iter().map(Into::into).collect();
                rooms.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                Ok(rooms)
            }
        }
    }

    async fn list_private_chat_rooms_for_user(&self, user_id: &str) -> StoreResult<Vec<ChatRoom>> {
        let rows = sqlx::query_as::<_, RoomRow>(
            r#"SELECT id, name, description, kind, visibility, code, participants, created_by, video_room_id, created_at, updated_at
               FROM rooms WHERE visibility = 'private' AND $1 = ANY(participants)
               ORDER BY updated_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn add_chat_participant(&self, room_id: &str, user_id: &str) -> StoreResult<ChatRoom> {
        let row = sqlx::query_as::<_, RoomRow>(
            r#"
            UPDATE rooms
            SET participants = CASE WHEN $2 = ANY(participants) THEN participants ELSE array_append(participants, $2) END,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, kind, visibility, code, participants, created_by, video_room_id, created_at, updated_at
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn touch_chat_room(&self, room_id: &str) -> StoreResult<()> {
        sqlx::query("UPDATE rooms SET updated_at = now() WHERE id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_chat_message(&self, msg: NewChatMessage) -> StoreResult<ChatMessage> {
        let id = new_id();
        let row = sqlx::query_as::<_, MessageRow>(
            r#"
            INSERT INTO messages (id, room_id, sender_id, sender_name, sender_avatar, content, kind, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, room_id, sender_id, sender_name, sender_avatar, content, kind, metadata, "timestamp"
            "#,
        )
        .bind(&id)
        .bind(&msg.room_id)
        .bind(&msg.sender_id)
        .bind(&msg.sender_name)
        .bind(&msg.sender_avatar)
        .bind(&msg.content)
        .bind(message_kind_to_str(msg.kind))
        .bind(&msg.metadata)
        .fetch_one(&self.pool)
        .await?;
        self.touch_chat_room(&msg.room_id).await?;
        Ok(row.into())
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
        let result = match cursor {
            Some(cursor_id) => {
                sqlx::query_as::<_, MessageRow>(
                    r#"
                    SELECT id, room_id, sender_id, sender_name, sender_avatar, content, kind, metadata, "timestamp"
                    FROM messages
                    WHERE room_id = $1 AND ("timestamp", id) < (
                        SELECT "timestamp", id FROM messages WHERE id = $2
                    )
                    ORDER BY "timestamp" DESC
                    LIMIT $3
                    "#,
                )
                .bind(room_id)
                .bind(cursor_id)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, MessageRow>(
                    r#"
                    SELECT id, room_id, sender_id, sender_name, sender_avatar, content, kind, metadata, "timestamp"
                    FROM messages
                    WHERE room_id = $1
                    ORDER BY "timestamp" DESC
                    LIMIT $2
                    "#,
                )
                .bind(room_id)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await
            }
        };
        match result {
            Ok(rows) => Ok(rows.into_iter().map(Into::into).collect()),
            Err(_) => {
                tracing::warn!("falling back to unordered message scan for room {room_id}");
                let rows = sqlx::query_as::<_, MessageRow>(
                    r#"SELECT id, room_id, sender_id, sender_name, sender_avatar, content, kind, metadata, "timestamp"
                       FROM messages WHERE room_id = $1"#,
                )
                .bind(room_id)
                .fetch_all(&self.pool)
                .await?;
                let mut messages: Vec<ChatMessage> = rows.into_iter().map(Into::into).collect();
                messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
                messages.truncate(limit as usize);
                Ok(messages)
            }
        }
    }

    async fn create_video_room(&self, room: NewVideoRoom) -> StoreResult<VideoRoom> {
        let id = new_id();
        let participants = vec![room.host_id.clone()];
        let row = sqlx::query_as::<_, VideoRoomRow>(
            r#"
            INSERT INTO video_rooms (id, name, description, host_id, participants, max_participants, visibility, code, chat_room_id, chat_room_code)
            VALUES ($1, $2, $3, $4, $5, $6, 'public', $7, $8, $9)
            RETURNING id, name, description, host_id, participants, max_participants, visibility, code, chat_room_id, chat_room_code, created_at, updated_at
            "#,
        )
        .bind(&id)
        .bind(&room.name)
        .bind(&room.description)
        .bind(&room.host_id)
        .bind(&participants)
        .bind(room.max_participants as i32)
        .bind(&room.code)
        .bind(&room.chat_room_id)
        .bind(&room.chat_room_code)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn get_video_room(&self, id: &str) -> StoreResult<Option<VideoRoom>> {
        let row = sqlx::query_as::<_, VideoRoomRow>(
            r#"SELECT id, name, description, host_id, participants, max_participants, visibility, code, chat_room_id, chat_room_code, created_at, updated_at
               FROM video_rooms WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn get_video_room_by_code(&self, code: &str) -> StoreResult<Option<VideoRoom>> {
        let row = sqlx::query_as::<_, VideoRoomRow>(
            r#"SELECT id, name, description, host_id, participants, max_participants, visibility, code, chat_room_id, chat_room_code, created_at, updated_at
               FROM video_rooms WHERE code = $1"#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn video_room_code_exists(&self, code: &str) -> StoreResult<bool> {
        let row: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM video_rooms WHERE code = $1)")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0)
    }

    async fn add_video_participant(&self, room_id: &str, user_id: &str) -> StoreResult<VideoRoom> {
        // Compare-and-set: the WHERE clause only matches when there is
        // still capacity or the user is already a participant, making
        // concurrent joins on the last slot race safely (§5).
        let row = sqlx::query_as::<_, VideoRoomRow>(
            r#"
            UPDATE video_rooms
            SET participants = CASE WHEN $2 = ANY(participants) THEN participants ELSE array_append(participants, $2) END,
                updated_at = now()
            WHERE id = $1
              AND ($2 = ANY(participants) OR array_length(participants, 1) IS NULL OR array_length(participants, 1) < max_participants)
            RETURNING id, name, description, host_id, participants, max_participants, visibility, code, chat_room_id, chat_room_code, created_at, updated_at
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        match row {
            Some(r) => Ok(r.into()),
            None => match self.get_video_room(room_id).await? {
                Some(room) if room.is_full() => Err(StoreError::Conflict("room full".into())),
                Some(room) => Ok(room),
                None => Err(StoreError::NotFound),
            },
        }
    }

    async fn remove_video_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<VideoRoom> {
        let row = sqlx::query_as::<_, VideoRoomRow>(
            r#"
            UPDATE video_rooms
            SET participants = array_remove(participants, $2), updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, host_id, participants, max_participants, visibility, code, chat_room_id, chat_room_code, created_at, updated_at
            "#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn delete_video_room(&self, room_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM video_rooms WHERE id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert_video_participant(&self, participant: VideoParticipant) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO video_participants (room_id, user_id, socket_id, display_name, email, audio_enabled, video_enabled, screen_sharing, joined_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (room_id, user_id) DO UPDATE SET
                socket_id = EXCLUDED.socket_id,
                display_name = EXCLUDED.display_name,
                email = EXCLUDED.email,
                audio_enabled = EXCLUDED.audio_enabled,
                video_enabled = EXCLUDED.video_enabled,
                screen_sharing = EXCLUDED.screen_sharing
            "#,
        )
        .bind(&participant.room_id)
        .bind(&participant.user_id)
        .bind(&participant.socket_id)
        .bind(&participant.display_name)
        .bind(&participant.email)
        .bind(participant.audio_enabled)
        .bind(participant.video_enabled)
        .bind(participant.screen_sharing)
        .bind(participant.joined_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_video_participant(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<Option<VideoParticipant>> {
        let row = sqlx::query_as::<_, VideoParticipantRow>(
            r#"SELECT room_id, user_id, socket_id, display_name, email, audio_enabled, video_enabled, screen_sharing, joined_at
               FROM video_participants WHERE room_id = $1 AND user_id = $2"#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_video_participants(&self, room_id: &str) -> StoreResult<Vec<VideoParticipant>> {
        let rows = sqlx::query_as::<_, VideoParticipantRow>(
            r#"SELECT room_id, user_id, socket_id, display_name, email, audio_enabled, video_enabled, screen_sharing, joined_at
               FROM video_participants WHERE room_id = $1"#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn remove_video_participant_record(
        &self,
        room_id: &str,
        user_id: &str,
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM video_participants WHERE room_id = $1 AND user_id = $2")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_all_video_participants(&self, room_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM video_participants WHERE room_id = $1")
            .bind(room_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
