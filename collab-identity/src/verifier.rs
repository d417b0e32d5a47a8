//! The `TokenVerifier` contract (§2 component A).

use async_trait::async_trait;
use collab_types::UserDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("token is malformed or has an invalid signature")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Resolves an opaque bearer token to a [`UserDescriptor`]. The core never
/// learns how the token was produced (HMAC JWT, OAuth-backed session,
/// anything else), only whether it is valid and who it names.
#[async_trait]
pub trait TokenVerifier: Send + Sync + 'static {
    async fn verify(&self, token: &str) -> Result<UserDescriptor, VerifyError>;
}
