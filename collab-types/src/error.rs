//! Error taxonomy shared by every engine.
//!
//! Every failed operation surfaces one of these codes, either as the
//! `code` field of a duplex `error` event or as the `error` field of a
//! JSON HTTP response (see [`crate::response::ApiResponse`]).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable, machine-readable error code. Prose messages are informational
/// only; callers should branch on `code`, never on `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorCode {
    AuthRequired,
    AuthFailed,
    Unauthorized,
    ValidationError,
    InvalidCodeFormat,
    InvalidSignalType,
    InvalidSignalStructure,
    MissingSignalData,
    MustIncludeTarget,
    RoomNotFound,
    TargetUserNotFound,
    CodeRequired,
    InvalidCode,
    NotPrivateRoom,
    NotParticipant,
    NotInRoom,
    RoomFull,
    StoreTimeout,
    StoreUnavailable,
    CodeGenerationFailed,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::AuthFailed => "AUTH_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::InvalidCodeFormat => "INVALID_CODE_FORMAT",
            ErrorCode::InvalidSignalType => "INVALID_SIGNAL_TYPE",
            ErrorCode::InvalidSignalStructure => "INVALID_SIGNAL_STRUCTURE",
            ErrorCode::MissingSignalData => "MISSING_SIGNAL_DATA",
            ErrorCode::MustIncludeTarget => "MUST_INCLUDE_TARGET",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::TargetUserNotFound => "TARGET_USER_NOT_FOUND",
            ErrorCode::CodeRequired => "CODE_REQUIRED",
            ErrorCode::InvalidCode => "INVALID_CODE",
            ErrorCode::NotPrivateRoom => "NOT_PRIVATE_ROOM",
            ErrorCode::NotParticipant => "NOT_PARTICIPANT",
            ErrorCode::NotInRoom => "NOT_IN_ROOM",
            ErrorCode::RoomFull => "ROOM_FULL",
            ErrorCode::StoreTimeout => "STORE_TIMEOUT",
            ErrorCode::StoreUnavailable => "STORE_UNAVAILABLE",
            ErrorCode::CodeGenerationFailed => "CODE_GENERATION_FAILED",
            ErrorCode::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error carrying a stable [`ErrorCode`] and a human-readable message,
/// the shape every duplex `error` event and HTTP error body uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollabError {
    pub code: ErrorCode,
    pub message: String,
}

impl CollabError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "authentication required")
    }

    pub fn auth_failed() -> Self {
        Self::new(ErrorCode::AuthFailed, "credential verification failed")
    }

    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, detail)
    }

    pub fn room_not_found(room: impl fmt::Display) -> Self {
        Self::new(ErrorCode::RoomNotFound, format!("room '{room}' not found"))
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, detail)
    }
}

impl fmt::Display for CollabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
