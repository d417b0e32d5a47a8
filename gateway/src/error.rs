//! Gateway-side error response (§4.1 "per-backend failure isolation", §7).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use collab_types::{ApiResponse, CollabError, ErrorCode};

use crate::backend::BackendKind;

#[derive(Debug)]
pub struct GatewayError {
    pub status: StatusCode,
    pub body: CollabError,
}

impl GatewayError {
    /// A backend refused the connection, failed DNS resolution, or did
    /// not answer before headers arrived.
    pub fn backend_unavailable(backend: BackendKind, detail: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: CollabError::new(
                ErrorCode::ServiceUnavailable,
                format!("backend '{}' is unavailable: {detail}", backend.name()),
            ),
        }
    }

    pub fn bad_gateway_uri(detail: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            body: CollabError::new(ErrorCode::ServiceUnavailable, detail.to_string()),
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::err(self.body))).into_response()
    }
}
