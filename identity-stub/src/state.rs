//! Shared application state passed to every handler via `State`.

use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub jwt_secret: String,
    pub token_ttl_secs: i64,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_ttl_secs: config.token_ttl_secs,
        }
    }
}
