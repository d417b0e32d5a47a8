//! Upgrade-aware duplex proxy (§4.1).
//!
//! Per the redesign note against relying on an opaque proxy library's
//! hidden `upgrade` hook: this module hijacks the client connection on
//! `Upgrade` explicitly, dials the backend itself, relays the backend's
//! handshake response, and once both sides report a completed upgrade,
//! runs two independent byte pumps until either side closes.
//! No framing is parsed once upgraded; bytes pass through untouched.

use axum::body::Body;
use axum::http::{HeaderValue, Request, Response, StatusCode, Uri};
use hyper_util::rt::TokioIo;

use crate::backend::{Backend, BackendKind};
use crate::error::GatewayError;

/// Rewrites a request path+query by stripping `strip_prefix` and
/// prepending `prepend` (used for the auth backend's `/api/auth` →
/// `/auth` rewrite). An empty result becomes `/`.
pub fn rewrite_path(path_and_query: &str, strip_prefix: &str, prepend: &str) -> String {
    let stripped = path_and_query
        .strip_prefix(strip_prefix)
        .unwrap_or(path_and_query);
    let stripped = if stripped.is_empty() || !stripped.starts_with('/') {
        format!("/{stripped}")
    } else {
        stripped.to_string()
    };
    format!("{prepend}{stripped}")
}

fn is_upgrade_request(req: &Request<Body>) -> bool {
    req.headers()
        .get(axum::http::header::CONNECTION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_ascii_lowercase().contains("upgrade"))
        .unwrap_or(false)
        && req.headers().contains_key(axum::http::header::UPGRADE)
}

fn build_target_uri(backend: &Backend, target_path: &str) -> Result<Uri, GatewayError> {
    format!("{}{}", backend.base_url, target_path)
        .parse::<Uri>()
        .map_err(GatewayError::bad_gateway_uri)
}

/// Forwards `req` to `backend` at the rewritten `target_path`, choosing
/// the plain request/response path or the upgrade-hijack path based on
/// whether the incoming request carries the duplex-upgrade signal.
pub async fn proxy(
    backend: &Backend,
    target_path: &str,
    req: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    if is_upgrade_request(&req) {
        proxy_upgrade(backend, target_path, req).await
    } else {
        proxy_plain(backend, target_path, req).await
    }
}

async fn proxy_plain(
    backend: &Backend,
    target_path: &str,
    mut req: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    let uri = build_target_uri(backend, target_path)?;
    *req.uri_mut() = uri;
    req.headers_mut()
        .insert("x-forwarded-by", FORWARDED_BY.clone());

    let response = backend
        .client
        .request(req)
        .await
        .map_err(|e| GatewayError::backend_unavailable(backend.kind, e))?;

    Ok(response.map(Body::new))
}

async fn proxy_upgrade(
    backend: &Backend,
    target_path: &str,
    mut req: Request<Body>,
) -> Result<Response<Body>, GatewayError> {
    let uri = build_target_uri(backend, target_path)?;

    // Take the client-side upgrade future before the request moves.
    let client_upgrade = hyper::upgrade::on(&mut req);

    let mut outbound = Request::builder()
        .method(req.method().clone())
        .uri(uri)
        .version(req.version());
    for (name, value) in req.headers() {
        outbound = outbound.header(name, value);
    }
    let outbound = outbound
        .body(Body::empty())
        .map_err(GatewayError::bad_gateway_uri)?;

    let mut backend_response = backend
        .client
        .request(outbound)
        .await
        .map_err(|e| GatewayError::backend_unavailable(backend.kind, e))?;

    if backend_response.status() != StatusCode::SWITCHING_PROTOCOLS {
        // Backend declined the upgrade; hand its response straight back.
        return Ok(backend_response.map(Body::new));
    }

    let backend_upgrade = hyper::upgrade::on(&mut backend_response);
    let backend_name = backend.kind;

    tokio::spawn(async move {
        let (client_io, backend_io) = match tokio::try_join!(client_upgrade, backend_upgrade) {
            Ok(pair) => pair,
            Err(e) => {
                tracing::warn!(backend = backend_name.name(), error = %e, "upgrade handshake failed");
                return;
            }
        };

        let mut client_io = TokioIo::new(client_io);
        let mut backend_io = TokioIo::new(backend_io);

        if let Err(e) =
            tokio::io::copy_bidirectional(&mut client_io, &mut backend_io).await
        {
            tracing::debug!(backend = backend_name.name(), error = %e, "duplex session ended");
        }
    });

    let mut response = Response::builder().status(StatusCode::SWITCHING_PROTOCOLS);
    for (name, value) in backend_response.headers() {
        response = response.header(name, value);
    }
    let response = response
        .body(Body::empty())
        .map_err(GatewayError::bad_gateway_uri)?;
    Ok(response)
}

/// Header value used when the gateway itself needs to stamp an
/// `X-Forwarded-By` style marker; kept as a constant so proxy and tests
/// agree on its spelling.
pub const FORWARDED_BY: HeaderValue = HeaderValue::from_static("realtime-collab-gateway");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_prefix_and_prepends() {
        assert_eq!(
            rewrite_path("/api/auth/login?x=1", "/api/auth", "/auth"),
            "/auth/login?x=1"
        );
    }

    #[test]
    fn strips_prefix_with_no_remainder_becomes_root() {
        assert_eq!(rewrite_path("/api/chat", "/api/chat", ""), "/");
    }

    #[test]
    fn strips_prefix_and_keeps_trailing_slash_path() {
        assert_eq!(rewrite_path("/api/video/ws", "/api/video", ""), "/ws");
    }

    #[test]
    fn unmatched_prefix_is_left_untouched() {
        assert_eq!(rewrite_path("/other", "/api/chat", ""), "/other");
    }
}
