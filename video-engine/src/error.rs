//! Maps a [`CollabError`] onto an HTTP response for the `/api/video/...`
//! surface (§6). The duplex transport never uses this; it sends
//! `CollabError` as the payload of an `error` frame instead.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use collab_types::{ApiResponse, CollabError, ErrorCode};

pub struct HttpError(pub CollabError);

impl From<CollabError> for HttpError {
    fn from(err: CollabError) -> Self {
        Self(err)
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::RoomNotFound | ErrorCode::TargetUserNotFound => StatusCode::NOT_FOUND,
            ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
            ErrorCode::Unauthorized => StatusCode::FORBIDDEN,
            ErrorCode::ValidationError | ErrorCode::InvalidCodeFormat => StatusCode::BAD_REQUEST,
            ErrorCode::RoomFull => StatusCode::CONFLICT,
            ErrorCode::StoreTimeout | ErrorCode::StoreUnavailable | ErrorCode::ServiceUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ApiResponse::<()>::err(self.0))).into_response()
    }
}
