//! Video engine configuration loaded from environment variables.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP/WS server (e.g. "0.0.0.0:8092").
    pub listen_addr: String,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Shared secret used to verify session JWTs (HMAC).
    pub jwt_secret: String,
    /// Signaling duplicate-suppression window (§4.4.3 "optional
    /// profile"). Off unless `SIGNAL_DEDUPE_WINDOW_MS` is set.
    pub dedupe_window: Option<Duration>,
}

impl Config {
    /// # Required
    /// - `DATABASE_URL`, `JWT_SECRET`
    ///
    /// # Optional
    /// - `LISTEN_ADDR` (default: `"0.0.0.0:8092"`)
    /// - `SIGNAL_DEDUPE_WINDOW_MS` (default: unset, dedupe disabled)
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET environment variable is required")?;
        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8092".to_string());

        let dedupe_window = match env::var("SIGNAL_DEDUPE_WINDOW_MS") {
            Ok(raw) => {
                let ms: u64 = raw
                    .parse()
                    .map_err(|_| "SIGNAL_DEDUPE_WINDOW_MS must be an integer number of milliseconds")?;
                Some(Duration::from_millis(ms))
            }
            Err(_) => None,
        };

        Ok(Self {
            listen_addr,
            database_url,
            jwt_secret,
            dedupe_window,
        })
    }
}
