//! HTTP-backed [`TokenVerifier`] that delegates to a remote identity
//! service's `GET /auth/me` endpoint, for deployments where the engines
//! and the identity service run as separate processes rather than
//! sharing the HMAC secret.

use async_trait::async_trait;
use collab_types::UserDescriptor;
use std::time::Duration;

use crate::verifier::{TokenVerifier, VerifyError};

pub struct HttpTokenVerifier {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTokenVerifier {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .expect("reqwest client builder should not fail with these options");
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> Result<UserDescriptor, VerifyError> {
        let url = format!("{}/auth/me", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<UserDescriptor>()
                .await
                .map_err(|e| VerifyError::Unavailable(e.to_string())),
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Err(VerifyError::Invalid)
            }
            status => Err(VerifyError::Unavailable(format!(
                "identity service returned {status}"
            ))),
        }
    }
}
