//! Video business logic (§4.4), transport-agnostic. Owns the registry,
//! the store handle and the optional signaling dedupe window; [`ws`](crate::ws)
//! decodes frames into [`collab_types::events::VideoClientEvent`]s and
//! calls into here.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, RwLock};

use collab_store::{codes, NewChatRoom, NewVideoRoom, Store, StoreError};
use collab_types::events::{ParticipantSnapshot, SignalKind, SignalRequest, VideoServerEvent};
use collab_types::model::{RoomKind, Visibility, VideoParticipant, VideoRoom};
use collab_types::{CollabError, ErrorCode, UserDescriptor};

use crate::registry::Registry;

type Sender = mpsc::UnboundedSender<VideoServerEvent>;

pub struct VideoEngine {
    store: std::sync::Arc<dyn Store>,
    registry: Registry,
    session_user: RwLock<HashMap<String, String>>,
    dedupe_window: Option<Duration>,
    recent_signals: Mutex<HashMap<String, Instant>>,
}

impl VideoEngine {
    pub fn new(store: std::sync::Arc<dyn Store>, dedupe_window: Option<Duration>) -> Self {
        Self {
            store,
            registry: Registry::new(),
            session_user: RwLock::new(HashMap::new()),
            dedupe_window,
            recent_signals: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub async fn on_connect(&self, session_id: &str, user_id: &str, sender: Sender) {
        self.registry.connect(session_id, sender).await;
        self.session_user
            .write()
            .await
            .insert(session_id.to_string(), user_id.to_string());
    }

    /// Runs leave logic for every room the session was subscribed to,
    /// then forgets the session. Cleanup lives here; the transport layer
    /// broadcasts nothing on disconnect itself.
    pub async fn on_disconnect(&self, session_id: &str) {
        let user_id = self.session_user.write().await.remove(session_id);
        let rooms = self.registry.disconnect(session_id).await;
        if let Some(user_id) = user_id {
            for room_id in rooms {
                self.leave_room(&user_id, session_id, &room_id).await;
            }
        }
    }

    // ---- §4.4.2 rooms ----------------------------------------------------

    pub async fn create_room(
        &self,
        host: &UserDescriptor,
        session_id: &str,
        name: String,
        description: Option<String>,
        with_chat_room: bool,
    ) -> Result<VideoRoom, CollabError> {
        if name.trim().is_empty() {
            return Err(CollabError::validation("room name must not be empty"));
        }

        let code = codes::generate_unique_video_code(self.store.as_ref()).await?;
        let mut room = self
            .store
            .create_video_room(NewVideoRoom {
                name: name.clone(),
                description: description.clone(),
                host_id: host.user_id.clone(),
                max_participants: VideoRoom::DEFAULT_MAX_PARTICIPANTS,
                code,
                chat_room_id: None,
                chat_room_code: None,
            })
            .await?;

        if with_chat_room {
            let chat_code = codes::generate_unique_chat_code(self.store.as_ref()).await?;
            let chat_room = self
                .store
                .create_chat_room(NewChatRoom {
                    name,
                    description,
                    kind: RoomKind::Group,
                    visibility: Visibility::Private,
                    code: Some(chat_code.clone()),
                    participants: vec![host.user_id.clone()],
                    created_by: host.user_id.clone(),
                    video_room_id: Some(room.id.clone()),
                })
                .await?;
            // The Store trait has no "update video room" operation, so the
            // reverse link only lives on the object handed back here and
            // in the broadcast payload, not in the persisted video room
            // row. The authoritative link is ChatRoom.video_room_id.
            room.chat_room_id = Some(chat_room.id);
            room.chat_room_code = Some(chat_code);
        }

        let participant = VideoParticipant::new(room.id.clone(), host.user_id.clone(), session_id.to_string());
        self.store.upsert_video_participant(participant).await?;
        self.registry.subscribe(&room.id, session_id).await;

        Ok(room)
    }

    pub async fn join_room(
        &self,
        user: &UserDescriptor,
        session_id: &str,
        room_id: Option<&str>,
        code: Option<&str>,
    ) -> Result<(VideoRoom, Vec<ParticipantSnapshot>), CollabError> {
        let room = if let Some(code) = code {
            let normalized = codes::normalize_code(code)
                .ok_or_else(|| CollabError::new(ErrorCode::RoomNotFound, "malformed room code"))?;
            self.store
                .get_video_room_by_code(&normalized)
                .await?
                .ok_or_else(|| CollabError::new(ErrorCode::RoomNotFound, "no room with that code"))?
        } else if let Some(id) = room_id {
            self.store
                .get_video_room(id)
                .await?
                .ok_or_else(|| CollabError::room_not_found(id))?
        } else {
            return Err(CollabError::validation("roomId or code is required"));
        };

        let already_member = room.participants.iter().any(|p| p == &user.user_id);
        if room.is_full() && !already_member {
            return Err(CollabError::new(ErrorCode::RoomFull, "room is at capacity"));
        }

        let room = if already_member {
            room
        } else {
            match self.store.add_video_participant(&room.id, &user.user_id).await {
                Ok(r) => r,
                Err(StoreError::Conflict(_)) => {
                    return Err(CollabError::new(ErrorCode::RoomFull, "room is at capacity"))
                }
                Err(e) => return Err(e.into()),
            }
        };

        let participant = VideoParticipant {
            room_id: room.id.clone(),
            user_id: user.user_id.clone(),
            socket_id: session_id.to_string(),
            display_name: user.display_name.clone(),
            email: user.email.clone(),
            audio_enabled: true,
            video_enabled: true,
            screen_sharing: false,
            joined_at: chrono::Utc::now(),
        };
        self.store.upsert_video_participant(participant.clone()).await?;

        if let Some(chat_room_id) = room.chat_room_id.clone() {
            self.store.try_add_chat_participant(&chat_room_id, &user.user_id).await;
        }

        self.registry.subscribe(&room.id, session_id).await;
        self.registry
            .broadcast_room(
                &room.id,
                VideoServerEvent::UserJoined {
                    room_id: room.id.clone(),
                    participant: Self::to_snapshot(&participant),
                },
                Some(session_id),
            )
            .await;

        let participants = self.store.list_video_participants(&room.id).await?;
        let snapshots = participants.iter().map(Self::to_snapshot).collect();

        Ok((room, snapshots))
    }

    /// Removes the participant and their record. Idempotent: a missing
    /// room or a participant already absent is treated as already-left.
    pub async fn leave_room(&self, user_id: &str, session_id: &str, room_id: &str) {
        match self.store.remove_video_participant(room_id, user_id).await {
            Ok(_) | Err(StoreError::NotFound) => {}
            Err(e) => tracing::warn!(error = %e, room_id, user_id, "failed to remove video participant"),
        }
        let _ = self.store.remove_video_participant_record(room_id, user_id).await;

        self.registry.unsubscribe(room_id, session_id).await;
        self.registry
            .broadcast_room(
                room_id,
                VideoServerEvent::UserLeft {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                },
                Some(session_id),
            )
            .await;
    }

    /// Host-only. Idempotent: a second call on an already-ended room
    /// surfaces `ROOM_NOT_FOUND`.
    pub async fn end_room(&self, user_id: &str, room_id: &str) -> Result<(), CollabError> {
        let room = self
            .store
            .get_video_room(room_id)
            .await?
            .ok_or_else(|| CollabError::new(ErrorCode::RoomNotFound, "room not found"))?;
        if room.host_id != user_id {
            return Err(CollabError::unauthorized("only the host may end this room"));
        }

        self.store.delete_all_video_participants(room_id).await?;
        self.store.delete_video_room(room_id).await?;

        self.registry
            .broadcast_room(
                room_id,
                VideoServerEvent::RoomEnded {
                    room_id: room_id.to_string(),
                },
                None,
            )
            .await;
        self.registry.clear_room(room_id).await;

        Ok(())
    }

    pub async fn get_room(&self, room_id: &str) -> Result<VideoRoom, CollabError> {
        self.store
            .get_video_room(room_id)
            .await?
            .ok_or_else(|| CollabError::new(ErrorCode::RoomNotFound, "room not found"))
    }

    pub async fn list_participants(&self, room_id: &str) -> Result<Vec<ParticipantSnapshot>, CollabError> {
        let participants = self.store.list_video_participants(room_id).await?;
        Ok(participants.iter().map(Self::to_snapshot).collect())
    }

    /// Returns `(screen_sharing, video_enabled, audio_enabled)`.
    pub async fn screen_sharing_state(&self, room_id: &str, user_id: &str) -> Result<(bool, bool, bool), CollabError> {
        let participant = self
            .store
            .get_video_participant(room_id, user_id)
            .await?
            .ok_or_else(|| CollabError::new(ErrorCode::TargetUserNotFound, "participant not found"))?;
        Ok((participant.screen_sharing, participant.video_enabled, participant.audio_enabled))
    }

    // ---- §4.4.3 signaling relay -------------------------------------------

    pub async fn signal(&self, sender: &UserDescriptor, session_id: &str, req: SignalRequest) -> Result<(), CollabError> {
        Self::validate_signal_payload(req.signal_kind, &req.payload)?;

        if matches!(req.signal_kind, SignalKind::Offer | SignalKind::Answer) && req.target_user_id.is_none() {
            return Err(CollabError::new(
                ErrorCode::MustIncludeTarget,
                "offer/answer signals must include a targetUserId",
            ));
        }

        let room = self
            .store
            .get_video_room(&req.room_id)
            .await?
            .ok_or_else(|| CollabError::new(ErrorCode::RoomNotFound, "room not found"))?;
        if !room.participants.iter().any(|p| p == &sender.user_id) {
            return Err(CollabError::new(ErrorCode::NotInRoom, "not a participant of this room"));
        }

        if self.is_duplicate(&req, &sender.user_id) {
            return Ok(());
        }

        let sender_participant = self
            .store
            .get_video_participant(&req.room_id, &sender.user_id)
            .await?
            .ok_or_else(|| CollabError::new(ErrorCode::NotInRoom, "participant record missing"))?;

        let mut metadata = req.metadata.clone().unwrap_or_else(|| serde_json::json!({}));
        if let serde_json::Value::Object(ref mut map) = metadata {
            map.insert("audio_enabled".into(), serde_json::json!(sender_participant.audio_enabled));
            map.insert("video_enabled".into(), serde_json::json!(sender_participant.video_enabled));
            map.insert("screen_sharing".into(), serde_json::json!(sender_participant.screen_sharing));
            map.insert("stream_type".into(), serde_json::json!(sender_participant.stream_type()));
        }

        let event = VideoServerEvent::Signal {
            signal_kind: req.signal_kind,
            room_id: req.room_id.clone(),
            from_user_id: sender.user_id.clone(),
            target_user_id: req.target_user_id.clone(),
            payload: req.payload.clone(),
            metadata,
        };

        if let Some(target_user_id) = &req.target_user_id {
            let target = self
                .store
                .get_video_participant(&req.room_id, target_user_id)
                .await?
                .ok_or_else(|| CollabError::new(ErrorCode::TargetUserNotFound, "target user is not in the room"))?;
            self.registry.send_to(&target.socket_id, event).await;
        } else {
            self.registry.broadcast_room(&req.room_id, event, Some(session_id)).await;
        }

        Ok(())
    }

    fn validate_signal_payload(kind: SignalKind, payload: &serde_json::Value) -> Result<(), CollabError> {
        match kind {
            SignalKind::Offer | SignalKind::Answer => {
                let sdp_ok = payload
                    .get("sdp")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|s| !s.is_empty());
                if !sdp_ok {
                    return Err(CollabError::new(
                        ErrorCode::InvalidSignalStructure,
                        "offer/answer payload requires a non-empty sdp string",
                    ));
                }
            }
            SignalKind::IceCandidate => {
                let candidate_ok = payload
                    .get("candidate")
                    .and_then(serde_json::Value::as_str)
                    .is_some_and(|s| !s.is_empty());
                if !candidate_ok {
                    return Err(CollabError::new(
                        ErrorCode::InvalidSignalStructure,
                        "ice-candidate payload requires a non-empty candidate string",
                    ));
                }
                if let Some(v) = payload.get("sdpMLineIndex") {
                    if !v.is_null() && !v.is_i64() && !v.is_u64() {
                        return Err(CollabError::new(
                            ErrorCode::InvalidSignalStructure,
                            "sdpMLineIndex must be null or an integer",
                        ));
                    }
                }
                if let Some(v) = payload.get("sdpMid") {
                    if !v.is_null() && !v.is_string() {
                        return Err(CollabError::new(
                            ErrorCode::InvalidSignalStructure,
                            "sdpMid must be null or a string",
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn dedupe_key(req: &SignalRequest, sender: &str) -> String {
        let prefix: String = req.payload.to_string().chars().take(64).collect();
        format!(
            "{}|{}|{:?}|{:?}|{}",
            req.room_id, sender, req.signal_kind, req.target_user_id, prefix
        )
    }

    fn is_duplicate(&self, req: &SignalRequest, sender: &str) -> bool {
        let Some(window) = self.dedupe_window else {
            return false;
        };
        let key = Self::dedupe_key(req, sender);
        let now = Instant::now();
        let mut recent = self.recent_signals.lock().unwrap();
        recent.retain(|_, seen_at| now.duration_since(*seen_at) < window);
        if recent.contains_key(&key) {
            return true;
        }
        recent.insert(key, now);
        false
    }

    // ---- §4.4.4 media state toggles ---------------------------------------

    pub async fn toggle_audio(&self, user_id: &str, room_id: &str, enabled: bool) -> Result<(), CollabError> {
        self.update_participant(room_id, user_id, |p| p.audio_enabled = enabled).await?;
        self.registry
            .broadcast_room(
                room_id,
                VideoServerEvent::AudioToggled {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                    enabled,
                },
                None,
            )
            .await;
        Ok(())
    }

    pub async fn toggle_video(&self, user_id: &str, room_id: &str, enabled: bool) -> Result<(), CollabError> {
        self.update_participant(room_id, user_id, |p| p.video_enabled = enabled).await?;
        self.registry
            .broadcast_room(
                room_id,
                VideoServerEvent::VideoToggled {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                    enabled,
                },
                None,
            )
            .await;
        Ok(())
    }

    pub async fn toggle_screen(
        &self,
        user_id: &str,
        session_id: &str,
        room_id: &str,
        enabled: bool,
    ) -> Result<(), CollabError> {
        self.update_participant(room_id, user_id, |p| p.screen_sharing = enabled).await?;
        self.registry
            .broadcast_room(
                room_id,
                VideoServerEvent::ScreenToggled {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                    enabled,
                },
                None,
            )
            .await;
        if enabled {
            self.registry
                .broadcast_room(
                    room_id,
                    VideoServerEvent::ScreenNegotiationNeeded {
                        room_id: room_id.to_string(),
                        user_id: user_id.to_string(),
                    },
                    Some(session_id),
                )
                .await;
        }
        Ok(())
    }

    pub async fn screen_start(&self, user_id: &str, room_id: &str) -> Result<(), CollabError> {
        self.update_participant(room_id, user_id, |p| p.screen_sharing = true).await?;
        self.registry
            .broadcast_room(
                room_id,
                VideoServerEvent::ScreenStarted {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                },
                None,
            )
            .await;
        Ok(())
    }

    pub async fn screen_stop(&self, user_id: &str, room_id: &str) -> Result<(), CollabError> {
        self.update_participant(room_id, user_id, |p| p.screen_sharing = false).await?;
        self.registry
            .broadcast_room(
                room_id,
                VideoServerEvent::ScreenStopped {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                },
                None,
            )
            .await;
        Ok(())
    }

    pub async fn stream_ready(
        &self,
        user_id: &str,
        room_id: &str,
        stream_id: Option<String>,
        screen_sharing: Option<bool>,
    ) -> Result<(), CollabError> {
        let participant = match screen_sharing {
            Some(screen_sharing) => {
                self.update_participant(room_id, user_id, |p| p.screen_sharing = screen_sharing)
                    .await?
            }
            None => self
                .store
                .get_video_participant(room_id, user_id)
                .await?
                .ok_or_else(|| CollabError::new(ErrorCode::NotInRoom, "not a participant of this room"))?,
        };

        let stream_id = stream_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        self.registry
            .broadcast_room(
                room_id,
                VideoServerEvent::StreamReady {
                    room_id: room_id.to_string(),
                    user_id: user_id.to_string(),
                    stream_id,
                    stream_type: participant.stream_type(),
                },
                None,
            )
            .await;
        Ok(())
    }

    async fn update_participant(
        &self,
        room_id: &str,
        user_id: &str,
        f: impl FnOnce(&mut VideoParticipant),
    ) -> Result<VideoParticipant, CollabError> {
        let mut participant = self
            .store
            .get_video_participant(room_id, user_id)
            .await?
            .ok_or_else(|| CollabError::new(ErrorCode::NotInRoom, "not a participant of this room"))?;
        f(&mut participant);
        self.store.upsert_video_participant(participant.clone()).await?;
        Ok(participant)
    }

    fn to_snapshot(p: &VideoParticipant) -> ParticipantSnapshot {
        ParticipantSnapshot {
            user_id: p.user_id.clone(),
            socket_id: p.socket_id.clone(),
            display_name: p.display_name.clone(),
            audio_enabled: p.audio_enabled,
            video_enabled: p.video_enabled,
            screen_sharing: p.screen_sharing,
        }
    }
}
