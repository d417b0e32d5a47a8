//! Shared application state passed to every handler via `State`.

use std::sync::Arc;

use collab_identity::TokenVerifier;

use crate::engine::VideoEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<VideoEngine>,
    pub verifier: Arc<dyn TokenVerifier>,
}

impl AppState {
    pub fn new(engine: Arc<VideoEngine>, verifier: Arc<dyn TokenVerifier>) -> Self {
        Self { engine, verifier }
    }
}
