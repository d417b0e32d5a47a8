//! Per-backend outbound connectors (§4.1 "per-backend failure isolation").
//!
//! Each backend gets its own [`hyper_util`] client/connector pair so a
//! DNS failure or connection refusal against one backend never touches
//! another's connection pool.

use axum::body::Body;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

pub type ProxyClient = Client<HttpConnector, Body>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Auth,
    Chat,
    Video,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Auth => "auth",
            BackendKind::Chat => "chat",
            BackendKind::Video => "video",
        }
    }
}

#[derive(Clone)]
pub struct Backend {
    pub kind: BackendKind,
    pub base_url: String,
    pub client: ProxyClient,
}

impl Backend {
    pub fn new(kind: BackendKind, base_url: String) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            kind,
            base_url,
            client,
        }
    }
}
