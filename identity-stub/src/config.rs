//! Configuration loaded from environment variables.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server (e.g. "0.0.0.0:8090").
    pub listen_addr: String,
    /// Shared secret used to sign and verify session JWTs.
    pub jwt_secret: String,
    /// Session token time-to-live in seconds (default: 3600).
    pub token_ttl_secs: i64,
}

impl Config {
    /// # Required
    /// - `JWT_SECRET`
    ///
    /// # Optional
    /// - `LISTEN_ADDR` (default: `"0.0.0.0:8090"`)
    /// - `TOKEN_TTL_SECS` (default: `"3600"`)
    pub fn from_env() -> Result<Self, String> {
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET environment variable is required")?;
        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8090".to_string());
        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse::<i64>()
            .map_err(|_| "TOKEN_TTL_SECS must be a valid integer")?;

        Ok(Self {
            listen_addr,
            jwt_secret,
            token_ttl_secs,
        })
    }
}
