//! Identity stub entry point.
//!
//! A standalone Axum service that signs and verifies the HMAC session
//! JWTs the gateway's backends accept. Password hashing and OAuth are
//! out of scope; this is the contract boundary only.

mod config;
mod routes;
mod state;

use config::Config;
use state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("failed to load configuration");
    let state = AppState::new(&config);
    let app = routes::router().with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!("identity-stub listening on {}", config.listen_addr);

    axum::serve(listener, app).await.expect("server error");
}
