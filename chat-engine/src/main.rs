//! Chat engine entry point.

use std::sync::Arc;

use chat_engine::{config::Config, routes, AppState, ChatEngine};
use collab_identity::hmac_jwt::HmacJwtVerifier;
use collab_store::pg::PgStore;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("failed to load configuration");

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .expect("failed to connect to PostgreSQL");

    let store = PgStore::new(pool);
    store.migrate().await.expect("failed to run migrations");

    let engine = Arc::new(ChatEngine::new(Arc::new(store)));
    let verifier = Arc::new(HmacJwtVerifier::new(config.jwt_secret.clone()));
    let state = AppState::new(engine, verifier);

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .expect("failed to bind listener");

    tracing::info!("chat-engine listening on {}", config.listen_addr);

    axum::serve(listener, app).await.expect("server error");
}
