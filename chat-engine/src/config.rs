//! Chat engine configuration loaded from environment variables.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP/WS server (e.g. "0.0.0.0:8091").
    pub listen_addr: String,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Shared secret used to verify session JWTs (HMAC).
    pub jwt_secret: String,
}

impl Config {
    /// # Required
    /// - `DATABASE_URL`, `JWT_SECRET`
    ///
    /// # Optional
    /// - `LISTEN_ADDR` (default: `"0.0.0.0:8091"`)
    pub fn from_env() -> Result<Self, String> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| "DATABASE_URL environment variable is required")?;
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET environment variable is required")?;
        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8091".to_string());

        Ok(Self {
            listen_addr,
            database_url,
            jwt_secret,
        })
    }
}
