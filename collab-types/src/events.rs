//! Duplex event envelopes (§4.3.5, §4.4.5).
//!
//! Every frame on the wire is `{"event": "<name>", "payload": <data>}`.
//! Decoding happens once, at the frame boundary, into one of these tagged
//! unions, replacing the "dynamic event dispatch" pattern from the design
//! notes with an exhaustive match.

use crate::error::CollabError;
use crate::model::{ChatMessage, ChatRoom, MessageKind, RoomKind, Visibility};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------- chat ---

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum ChatClientEvent {
    #[serde(rename = "room:create")]
    RoomCreate(CreateRoomRequest),
    #[serde(rename = "room:join")]
    RoomJoin(JoinRoomRequest),
    #[serde(rename = "room:join-by-code")]
    RoomJoinByCode(JoinByCodeRequest),
    #[serde(rename = "room:leave")]
    RoomLeave(RoomIdRequest),
    #[serde(rename = "room:get")]
    RoomGet(RoomIdRequest),
    #[serde(rename = "message:send")]
    MessageSend(SendMessageRequest),
    #[serde(rename = "messages:get")]
    MessagesGet(GetMessagesRequest),
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: RoomKind,
    pub visibility: Visibility,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRoomRequest {
    pub room_id: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinByCodeRequest {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomIdRequest {
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    pub room_id: String,
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

fn default_messages_limit() -> u32 {
    50
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetMessagesRequest {
    pub room_id: String,
    #[serde(default = "default_messages_limit")]
    pub limit: u32,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum ChatServerEvent {
    #[serde(rename = "rooms:list")]
    RoomsList(Vec<ChatRoom>),
    #[serde(rename = "room:created")]
    RoomCreated(ChatRoom),
    #[serde(rename = "room:joined")]
    RoomJoined(ChatRoom),
    #[serde(rename = "room:left")]
    RoomLeft { room_id: String },
    #[serde(rename = "room:details")]
    RoomDetails(ChatRoom),
    #[serde(rename = "room:user-joined")]
    RoomUserJoined { room_id: String, user_id: String },
    #[serde(rename = "room:user-left")]
    RoomUserLeft { room_id: String, user_id: String },
    #[serde(rename = "message:new")]
    MessageNew(ChatMessage),
    #[serde(rename = "messages:list")]
    MessagesList {
        room_id: String,
        messages: Vec<ChatMessage>,
    },
    #[serde(rename = "user:online")]
    UserOnline { user_id: String },
    #[serde(rename = "user:offline")]
    UserOffline { user_id: String },
    #[serde(rename = "error")]
    Error(CollabError),
}

// --------------------------------------------------------------- video ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum VideoClientEvent {
    #[serde(rename = "video:room:create")]
    RoomCreate(VideoCreateRoomRequest),
    #[serde(rename = "video:room:join")]
    RoomJoin(VideoJoinRoomRequest),
    #[serde(rename = "video:room:leave")]
    RoomLeave(VideoRoomIdRequest),
    #[serde(rename = "video:room:end")]
    RoomEnd(VideoRoomIdRequest),
    #[serde(rename = "video:signal")]
    Signal(SignalRequest),
    #[serde(rename = "video:toggle-audio")]
    ToggleAudio(ToggleRequest),
    #[serde(rename = "video:toggle-video")]
    ToggleVideo(ToggleRequest),
    #[serde(rename = "video:toggle-screen")]
    ToggleScreen(ToggleRequest),
    #[serde(rename = "video:screen:start")]
    ScreenStart(VideoRoomIdRequest),
    #[serde(rename = "video:screen:stop")]
    ScreenStop(VideoRoomIdRequest),
    #[serde(rename = "video:stream:ready")]
    StreamReady(StreamReadyRequest),
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoCreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// When set, an associated private chat room is also created.
    #[serde(default)]
    pub with_chat_room: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoJoinRoomRequest {
    #[serde(default)]
    pub room_id: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoRoomIdRequest {
    pub room_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalRequest {
    pub signal_kind: SignalKind,
    pub room_id: String,
    #[serde(default)]
    pub target_user_id: Option<String>,
    pub payload: serde_json::Value,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToggleRequest {
    pub room_id: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamReadyRequest {
    pub room_id: String,
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub screen_sharing: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantSnapshot {
    pub user_id: String,
    pub socket_id: String,
    pub display_name: Option<String>,
    pub audio_enabled: bool,
    pub video_enabled: bool,
    pub screen_sharing: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "payload")]
pub enum VideoServerEvent {
    #[serde(rename = "video:room:created")]
    RoomCreated(crate::model::VideoRoom),
    #[serde(rename = "video:room:joined")]
    RoomJoined {
        room: crate::model::VideoRoom,
        participants: Vec<ParticipantSnapshot>,
    },
    #[serde(rename = "video:room:left")]
    RoomLeft { room_id: String, user_id: String },
    #[serde(rename = "video:room:ended")]
    RoomEnded { room_id: String },
    #[serde(rename = "video:user:joined")]
    UserJoined {
        room_id: String,
        participant: ParticipantSnapshot,
    },
    #[serde(rename = "video:user:left")]
    UserLeft { room_id: String, user_id: String },
    #[serde(rename = "video:signal")]
    Signal {
        signal_kind: SignalKind,
        room_id: String,
        from_user_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        target_user_id: Option<String>,
        payload: serde_json::Value,
        metadata: serde_json::Value,
    },
    #[serde(rename = "video:audio:toggled")]
    AudioToggled {
        room_id: String,
        user_id: String,
        enabled: bool,
    },
    #[serde(rename = "video:video:toggled")]
    VideoToggled {
        room_id: String,
        user_id: String,
        enabled: bool,
    },
    #[serde(rename = "video:screen:toggled")]
    ScreenToggled {
        room_id: String,
        user_id: String,
        enabled: bool,
    },
    #[serde(rename = "video:screen:started")]
    ScreenStarted { room_id: String, user_id: String },
    #[serde(rename = "video:screen:stopped")]
    ScreenStopped { room_id: String, user_id: String },
    #[serde(rename = "video:screen:negotiation:needed")]
    ScreenNegotiationNeeded { room_id: String, user_id: String },
    #[serde(rename = "video:stream:ready")]
    StreamReady {
        room_id: String,
        user_id: String,
        stream_id: String,
        stream_type: &'static str,
    },
    #[serde(rename = "error")]
    Error(CollabError),
}
