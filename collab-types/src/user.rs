//! User descriptor, the only artifact the core consumes from identity.

use serde::{Deserialize, Serialize};

/// Transient, per-session user identity resolved by a `TokenVerifier`.
/// Never persisted by the core; ChatMessage/VideoParticipant only ever
/// snapshot the fields they need at the moment of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDescriptor {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserDescriptor {
    pub fn anonymous(session_id: &str) -> Self {
        let prefix: String = session_id.chars().take(6).collect();
        Self {
            user_id: format!("anonymous_{session_id}"),
            display_name: Some(format!("Guest {prefix}")),
            email: None,
            avatar_url: None,
        }
    }
}
