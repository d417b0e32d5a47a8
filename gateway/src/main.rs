//! Edge gateway entry point.
//!
//! The single externally reachable endpoint: health, API docs, and
//! upgrade-aware duplex proxying to the identity, chat and video
//! backends (§4.1).

mod backend;
mod config;
mod error;
mod proxy;
mod routes;
mod state;

use axum::http;
use config::Config;
use state::AppState;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("failed to load configuration");

    let cors = CorsLayer::new()
        .allow_origin(match &config.cors_origin {
            Some(origins) => {
                let values: Vec<http::HeaderValue> = origins
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|o| o.parse().expect("invalid CORS_ORIGIN entry"))
                    .collect();
                AllowOrigin::list(values)
            }
            None => AllowOrigin::mirror_request(),
        })
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::OPTIONS,
        ])
        .allow_headers([
            http::header::CONTENT_TYPE,
            http::header::AUTHORIZATION,
            http::header::ACCEPT,
        ])
        .allow_credentials(true);

    let state = AppState::new(&config);
    let app = routes::router(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!("gateway listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .await
        .expect("server error");
}
