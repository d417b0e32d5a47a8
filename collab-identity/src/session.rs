//! The shared Session Authenticator (§4.2, component F): extracts a
//! credential from an HTTP request or a duplex handshake, resolves it
//! through a `dyn TokenVerifier`, and returns the resulting
//! [`UserDescriptor`]. Both `chat-engine` and `video-engine` call the
//! same two functions so the credential-extraction rules never drift
//! between them.

use axum::http::{header, HeaderMap};
use collab_types::{CollabError, UserDescriptor};
use serde_json::Value;

use crate::verifier::{TokenVerifier, VerifyError};

fn map_verify_error(err: VerifyError) -> CollabError {
    match err {
        VerifyError::Invalid | VerifyError::Expired => CollabError::auth_failed(),
        VerifyError::Unavailable(detail) => CollabError::new(
            collab_types::ErrorCode::ServiceUnavailable,
            format!("identity service unavailable: {detail}"),
        ),
    }
}

/// Extracts `Authorization: Bearer <token>` from `headers` and resolves it.
/// Fails with `AUTH_REQUIRED` if the header is absent and `AUTH_FAILED` if
/// the token is present but rejected by the verifier.
pub async fn authenticate_request(
    verifier: &dyn TokenVerifier,
    headers: &HeaderMap,
) -> Result<UserDescriptor, CollabError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(CollabError::auth_required)?;

    verifier.verify(token).await.map_err(map_verify_error)
}

/// Extracts a credential from a duplex handshake: the `auth.token` field
/// of `handshake_payload` if present, otherwise the `token` query
/// parameter of `query`. Used by both engines at connection upgrade time
/// (§4.3.5 / §4.4.5 "connect").
///
/// `allow_anonymous` implements the video engine's documented exception
/// (§4.2, §4.4.1): when no credential is supplied at all, a synthetic
/// anonymous descriptor is returned instead of failing. A credential that
/// *is* supplied but rejected by the verifier still fails regardless of
/// `allow_anonymous`.
pub async fn authenticate_handshake(
    verifier: &dyn TokenVerifier,
    handshake_payload: Option<&Value>,
    query: &[(String, String)],
    session_id: &str,
    allow_anonymous: bool,
) -> Result<UserDescriptor, CollabError> {
    let from_payload = handshake_payload
        .and_then(|v| v.get("auth"))
        .and_then(|a| a.get("token"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let from_query = query
        .iter()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.clone());

    let token = from_payload.or(from_query);

    match token {
        Some(token) if !token.is_empty() => {
            verifier.verify(&token).await.map_err(map_verify_error)
        }
        _ if allow_anonymous => Ok(UserDescriptor::anonymous(session_id)),
        _ => Err(CollabError::auth_required()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmac_jwt::{issue, HmacJwtVerifier};
    use axum::http::HeaderValue;
    use serde_json::json;

    const SECRET: &str = "session-test-secret";

    #[tokio::test]
    async fn request_missing_header_is_auth_required() {
        let verifier = HmacJwtVerifier::new(SECRET);
        let headers = HeaderMap::new();
        let err = authenticate_request(&verifier, &headers).await.unwrap_err();
        assert_eq!(err.code, collab_types::ErrorCode::AuthRequired);
    }

    #[tokio::test]
    async fn request_valid_bearer_resolves_user() {
        let verifier = HmacJwtVerifier::new(SECRET);
        let token = issue(SECRET, 600, "u1", Some("Alice"), None).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        let user = authenticate_request(&verifier, &headers).await.unwrap();
        assert_eq!(user.user_id, "u1");
    }

    #[tokio::test]
    async fn handshake_reads_auth_token_field() {
        let verifier = HmacJwtVerifier::new(SECRET);
        let token = issue(SECRET, 600, "u2", None, None).unwrap();
        let payload = json!({ "auth": { "token": token } });
        let user = authenticate_handshake(&verifier, Some(&payload), &[], "sess1", false)
            .await
            .unwrap();
        assert_eq!(user.user_id, "u2");
    }

    #[tokio::test]
    async fn handshake_falls_back_to_query_token() {
        let verifier = HmacJwtVerifier::new(SECRET);
        let token = issue(SECRET, 600, "u3", None, None).unwrap();
        let query = vec![("token".to_string(), token)];
        let user = authenticate_handshake(&verifier, None, &query, "sess2", false)
            .await
            .unwrap();
        assert_eq!(user.user_id, "u3");
    }

    #[tokio::test]
    async fn handshake_without_credential_fails_when_anonymous_disallowed() {
        let verifier = HmacJwtVerifier::new(SECRET);
        let err = authenticate_handshake(&verifier, None, &[], "sess3", false)
            .await
            .unwrap_err();
        assert_eq!(err.code, collab_types::ErrorCode::AuthRequired);
    }

    #[tokio::test]
    async fn handshake_without_credential_synthesizes_anonymous_when_allowed() {
        let verifier = HmacJwtVerifier::new(SECRET);
        let user = authenticate_handshake(&verifier, None, &[], "sess4abcdef", true)
            .await
            .unwrap();
        assert_eq!(user.user_id, "anonymous_sess4abcdef");
        assert!(user.display_name.unwrap().starts_with("Guest "));
    }

    #[tokio::test]
    async fn handshake_rejects_bad_token_even_when_anonymous_allowed() {
        let verifier = HmacJwtVerifier::new(SECRET);
        let payload = json!({ "auth": { "token": "not-a-real-token" } });
        let err = authenticate_handshake(&verifier, Some(&payload), &[], "sess5", true)
            .await
            .unwrap_err();
        assert_eq!(err.code, collab_types::ErrorCode::AuthFailed);
    }
}
