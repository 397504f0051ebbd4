//! Upstream request forwarding.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the target base URL (path + query kept)
//! - Rewrite the Host header; pass every other header through
//! - Bound the forward call with the configured timeout
//! - Distinguish transport failure from application error statuses
//!
//! # Design Decisions
//! - Upstream statuses are never errors here; only failing to obtain a
//!   response is (connect error, timeout)
//! - Bodies arrive pre-buffered so a retry can replay them; responses
//!   stream back unbuffered

use std::str::FromStr;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Request, Response, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use thiserror::Error;
use tokio::time;

use crate::proxy::backend::BackendTarget;

/// Transport-level forwarding failure.
///
/// A response from the backend, whatever its status, is not a failure.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream connection failed: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),

    #[error("request could not be rebuilt for {0}: {1}")]
    BadTarget(String, axum::http::Error),
}

/// Forwards buffered inbound requests to a selected backend.
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    timeout: Duration,
}

impl Forwarder {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client, timeout }
    }

    /// Forward the request to `target`, returning the upstream response
    /// with whatever status it produced.
    pub async fn send(
        &self,
        parts: &Parts,
        body: &Bytes,
        target: &BackendTarget,
    ) -> Result<Response<hyper::body::Incoming>, ForwardError> {
        let uri = rewrite_uri(&parts.uri, target)?;
        let host = uri.authority().map(|a| a.as_str().to_string());

        let mut builder = Request::builder()
            .method(parts.method.clone())
            .uri(uri)
            .version(parts.version);

        if let Some(headers) = builder.headers_mut() {
            for (name, value) in parts.headers.iter() {
                headers.insert(name.clone(), value.clone());
            }
            // Everything passes through except Host.
            if let Some(host) = host.as_deref().and_then(|h| HeaderValue::from_str(h).ok()) {
                headers.insert(HOST, host);
            }
        }

        let request = builder
            .body(Body::from(body.clone()))
            .map_err(|e| ForwardError::BadTarget(target.base_url.to_string(), e))?;

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ForwardError::Transport(e)),
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
        }
    }
}

/// Graft the original path and query onto the target's scheme and authority.
fn rewrite_uri(original: &Uri, target: &BackendTarget) -> Result<Uri, ForwardError> {
    let scheme = if target.base_url.scheme() == "https" {
        Scheme::HTTPS
    } else {
        Scheme::HTTP
    };

    let host = target.base_url.host_str().unwrap_or_default();
    let authority = match target.base_url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let authority = Authority::from_str(&authority)
        .map_err(|e| ForwardError::BadTarget(target.base_url.to_string(), e.into()))?;

    let mut parts = original.clone().into_parts();
    parts.scheme = Some(scheme);
    parts.authority = Some(authority);
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }

    Uri::from_parts(parts).map_err(|e| ForwardError::BadTarget(target.base_url.to_string(), e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::backend::BackendRole;
    use url::Url;

    fn target(base: &str) -> BackendTarget {
        BackendTarget::new(BackendRole::Primary, Url::parse(base).unwrap())
    }

    #[test]
    fn test_rewrite_keeps_path_and_query() {
        let original: Uri = "/api/data?limit=5&cursor=abc".parse().unwrap();
        let uri = rewrite_uri(&original, &target("http://10.0.0.7:3000")).unwrap();
        assert_eq!(uri.to_string(), "http://10.0.0.7:3000/api/data?limit=5&cursor=abc");
    }

    #[test]
    fn test_rewrite_replaces_existing_authority() {
        let original: Uri = "http://edge.example.com/status".parse().unwrap();
        let uri = rewrite_uri(&original, &target("http://127.0.0.1:3001")).unwrap();
        assert_eq!(uri.to_string(), "http://127.0.0.1:3001/status");
    }

    #[test]
    fn test_rewrite_omits_default_port() {
        let original: Uri = "/health".parse().unwrap();
        let uri = rewrite_uri(&original, &target("https://fallback.example.com")).unwrap();
        assert_eq!(uri.to_string(), "https://fallback.example.com/health");
    }

    #[test]
    fn test_rewrite_defaults_empty_path_to_root() {
        let original = Uri::from_static("http://edge.example.com");
        let uri = rewrite_uri(&original, &target("http://127.0.0.1:3000")).unwrap();
        assert_eq!(uri.path(), "/");
        assert_eq!(uri.authority().unwrap(), "127.0.0.1:3000");
    }
}
