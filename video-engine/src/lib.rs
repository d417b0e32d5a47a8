//! Video signaling engine (§4.4): anonymous-friendly admission, public
//! rooms with join codes, a WebRTC signaling relay with payload
//! validation and per-target ordering, and media state toggles.

pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod routes;
pub mod state;
pub mod ws;

pub use engine::VideoEngine;
pub use state::AppState;
