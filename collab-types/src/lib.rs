//! Shared API contract for the realtime collaboration backend.
//!
//! This crate defines the wire types exchanged between the gateway, the
//! chat/video engines and their clients. It is intentionally
//! framework-agnostic: no `axum`, no `sqlx`, no transport of any kind.

pub mod error;
pub mod events;
pub mod model;
pub mod response;
pub mod user;

pub use error::{CollabError, ErrorCode};
pub use response::ApiResponse;
pub use user::UserDescriptor;
