//! Gateway configuration loaded from environment variables.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server (e.g. "0.0.0.0:8080").
    pub listen_addr: String,
    /// Base URL of the identity service (e.g. "http://127.0.0.1:8090").
    pub auth_service_url: String,
    /// Base URL of the chat realtime engine.
    pub chat_service_url: String,
    /// Base URL of the video signaling engine.
    pub video_service_url: String,
    /// Comma-separated list of allowed CORS origins. Empty mirrors the
    /// request origin, suitable for local development.
    pub cors_origin: Option<String>,
}

impl Config {
    /// # Required
    /// - `AUTH_SERVICE_URL`, `CHAT_SERVICE_URL`, `VIDEO_SERVICE_URL`
    ///
    /// # Optional
    /// - `LISTEN_ADDR` (default: `"0.0.0.0:8080"`)
    /// - `CORS_ORIGIN` (comma-separated; unset mirrors the request origin)
    pub fn from_env() -> Result<Self, String> {
        let auth_service_url = env::var("AUTH_SERVICE_URL")
            .map_err(|_| "AUTH_SERVICE_URL environment variable is required")?;
        let chat_service_url = env::var("CHAT_SERVICE_URL")
            .map_err(|_| "CHAT_SERVICE_URL environment variable is required")?;
        let video_service_url = env::var("VIDEO_SERVICE_URL")
            .map_err(|_| "VIDEO_SERVICE_URL environment variable is required")?;
        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
        let cors_origin = env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty());

        Ok(Self {
            listen_addr,
            auth_service_url: auth_service_url.trim_end_matches('/').to_string(),
            chat_service_url: chat_service_url.trim_end_matches('/').to_string(),
            video_service_url: video_service_url.trim_end_matches('/').to_string(),
            cors_origin,
        })
    }
}
