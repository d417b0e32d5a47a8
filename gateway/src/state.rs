//! Shared application state passed to every handler via `State`.

use std::sync::Arc;

use crate::backend::{Backend, BackendKind};
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<Inner>,
}

pub struct Inner {
    pub auth: Backend,
    pub chat: Backend,
    pub video: Backend,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            inner: Arc::new(Inner {
                auth: Backend::new(BackendKind::Auth, config.auth_service_url.clone()),
                chat: Backend::new(BackendKind::Chat, config.chat_service_url.clone()),
                video: Backend::new(BackendKind::Video, config.video_service_url.clone()),
            }),
        }
    }
}
