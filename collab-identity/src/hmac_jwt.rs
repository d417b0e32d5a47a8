//! HMAC-SHA256 JWT issuance and verification.
//!
//! One shared secret, one claims struct, `jsonwebtoken`'s `encode`/`decode`.
//! Used both by [`crate::verifier::TokenVerifier`] implementors and by
//! `identity-stub`, which issues the tokens this verifier checks.

use async_trait::async_trait;
use chrono::Utc;
use collab_types::UserDescriptor;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::verifier::{TokenVerifier, VerifyError};

/// Claims carried by a session token: `{sub, name, email, exp, iss}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    pub iss: String,
}

impl SessionClaims {
    pub const ISSUER: &'static str = "collab-identity";
}

/// Signs a session token for `user_id`, valid for `ttl_secs` seconds.
pub fn issue(
    secret: &str,
    ttl_secs: i64,
    user_id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        name: name.map(str::to_string),
        email: email.map(str::to_string),
        exp: Utc::now().timestamp() + ttl_secs,
        iss: SessionClaims::ISSUER.to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Verifies a token signed by [`issue`] against a shared secret.
pub struct HmacJwtVerifier {
    secret: String,
}

impl HmacJwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for HmacJwtVerifier {
    async fn verify(&self, token: &str) -> Result<UserDescriptor, VerifyError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[SessionClaims::ISSUER]);
        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => VerifyError::Expired,
            _ => VerifyError::Invalid,
        })?;

        Ok(UserDescriptor {
            user_id: data.claims.sub,
            display_name: data.claims.name,
            email: data.claims.email,
            avatar_url: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[tokio::test]
    async fn round_trips_claims() {
        let token = issue(SECRET, 600, "u1", Some("Alice"), Some("a@b.com")).unwrap();
        let verifier = HmacJwtVerifier::new(SECRET);
        let user = verifier.verify(&token).await.unwrap();
        assert_eq!(user.user_id, "u1");
        assert_eq!(user.display_name.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn rejects_wrong_secret() {
        let token = issue(SECRET, 600, "u1", None, None).unwrap();
        let verifier = HmacJwtVerifier::new("different-secret");
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Invalid));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let token = issue(SECRET, -60, "u1", None, None).unwrap();
        let verifier = HmacJwtVerifier::new(SECRET);
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, VerifyError::Expired));
    }
}
