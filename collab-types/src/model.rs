//! Persisted entity shapes (§3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Direct,
    Group,
    Channel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
    File,
    System,
}

impl Default for MessageKind {
    fn default() -> Self {
        MessageKind::Text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRoom {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub kind: RoomKind,
    pub visibility: Visibility,
    /// Redacted (set to `None`) before being sent to a non-participant
    /// viewer of a public room; always `None` for `visibility = public`
    /// wire payloads unless the caller is the creator at creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub participants: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_room_id: Option<String>,
}

impl ChatRoom {
    /// Returns a copy with `code` stripped, for non-participant viewers
    /// of a public room (§4.3.4 "Get room").
    pub fn redacted(&self) -> Self {
        let mut r = self.clone();
        r.code = None;
        r
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub room_id: String,
    pub sender_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_avatar: Option<String>,
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRoom {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub host_id: String,
    pub participants: Vec<String>,
    pub max_participants: u32,
    pub visibility: Visibility,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_room_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_room_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRoom {
    pub const DEFAULT_MAX_PARTICIPANTS: u32 = 8;

    pub fn is_full(&self) -> bool {
        self.participants.len() as u32 >= self.max_participants
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoParticipant {
    pub room_id: String,
    pub user_id: String,
    pub socket_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub screen_sharing: bool,
    pub joined_at: DateTime<Utc>,
}

impl VideoParticipant {
    pub fn new(room_id: String, user_id: String, socket_id: String) -> Self {
        Self {
            room_id,
            user_id,
            socket_id,
            display_name: None,
            email: None,
            audio_enabled: true,
            video_enabled: true,
            screen_sharing: false,
            joined_at: Utc::now(),
        }
    }

    pub fn stream_type(&self) -> &'static str {
        if self.screen_sharing {
            "screen"
        } else {
            "camera"
        }
    }
}
