//! `identity-stub`'s entire HTTP surface: issue and verify session tokens.
//!
//! This is not a general-purpose identity provider: password hashing and
//! OAuth are explicitly out of scope. It exists so the workspace can run
//! end-to-end locally and integration tests can exercise real HTTP/WS
//! traffic against a real `TokenVerifier` implementation.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use collab_identity::hmac_jwt;
use collab_types::UserDescriptor;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/token", post(issue_token))
        .route("/auth/me", get(whoami))
}

#[derive(Debug, Deserialize)]
struct IssueTokenRequest {
    user_id: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Serialize)]
struct IssueTokenResponse {
    token: String,
}

async fn issue_token(
    State(state): State<AppState>,
    Json(req): Json<IssueTokenRequest>,
) -> Result<Json<IssueTokenResponse>, StubError> {
    let token = hmac_jwt::issue(
        &state.jwt_secret,
        state.token_ttl_secs,
        &req.user_id,
        req.name.as_deref(),
        req.email.as_deref(),
    )
    .map_err(|e| {
        tracing::error!("failed to sign session token: {e}");
        StubError::internal("failed to sign token")
    })?;

    Ok(Json(IssueTokenResponse { token }))
}

async fn whoami(
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
) -> Result<Json<UserDescriptor>, StubError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(StubError::unauthorized)?;

    let verifier = hmac_jwt::HmacJwtVerifier::new(state.jwt_secret.clone());
    let user = {
        use collab_identity::TokenVerifier;
        verifier.verify(token).await.map_err(|_| StubError::unauthorized())?
    };

    Ok(Json(user))
}

struct StubError {
    status: StatusCode,
    message: String,
}

impl StubError {
    fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: "invalid or missing token".to_string(),
        }
    }

    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}
