//! Failover request routing.
//!
//! # Responsibilities
//! - Pick the planned target from the primary's cached liveness
//! - Forward, and on transport failure from the primary retry once
//!   against the fallback
//! - Synthesize the 503 envelope when no backend is reachable
//! - Tag every response with provenance and CORS headers
//!
//! # State Machine (per request)
//! ```text
//! HEALTH_CHECKED → TARGET_SELECTED → FORWARDING
//!     → FORWARDED                      (planned target answered)
//!     → RETRYING → FORWARDED           (emergency fallback answered)
//!     → RETRYING → BOTH_FAILED (503)
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderValue, Request, Response, StatusCode};

use crate::config::ProxyConfig;
use crate::health::HealthMonitor;
use crate::http::cors;
use crate::observability::metrics;
use crate::proxy::backend::{BackendRole, BackendSet, BackendTarget, ServedBy};
use crate::proxy::forward::Forwarder;

/// Provenance header added to every response.
pub const X_SERVED_BY: &str = "x-served-by";

/// Routes each inbound request to whichever backend can serve it.
pub struct FailoverRouter {
    backends: BackendSet,
    health: Arc<HealthMonitor>,
    forwarder: Forwarder,
    max_body_bytes: usize,
}

impl FailoverRouter {
    pub fn new(backends: BackendSet, health: Arc<HealthMonitor>, config: &ProxyConfig) -> Self {
        Self {
            backends,
            health,
            forwarder: Forwarder::new(Duration::from_secs(config.timeouts.forward_secs)),
            max_body_bytes: config.limits.max_body_bytes,
        }
    }

    /// Route one request: select, forward, fall back, annotate.
    pub async fn route(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let method = request.method().to_string();

        let (parts, body) = request.into_parts();

        // Buffered so the emergency retry can replay it.
        let body = match to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(_) => {
                let response = payload_too_large();
                metrics::record_request(&method, response.status().as_u16(), "none", start);
                return response;
            }
        };

        let planned: &BackendTarget = if self.health.is_healthy(&self.backends.primary).await {
            &self.backends.primary
        } else {
            &self.backends.fallback
        };

        tracing::debug!(
            backend = %planned.role,
            method = %parts.method,
            path = %parts.uri.path(),
            "Forwarding request"
        );

        let (upstream, served_by) = match self.forwarder.send(&parts, &body, planned).await {
            Ok(response) => (Some(response), ServedBy::planned(planned.role)),
            Err(e) if planned.role == BackendRole::Primary => {
                tracing::warn!(error = %e, "Primary forward failed, retrying against fallback");
                match self.forwarder.send(&parts, &body, &self.backends.fallback).await {
                    Ok(response) => (Some(response), ServedBy::FallbackEmergency),
                    Err(e) => {
                        tracing::error!(error = %e, "Emergency fallback forward failed");
                        (None, ServedBy::FallbackEmergency)
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Fallback forward failed, no retry available");
                (None, ServedBy::planned(planned.role))
            }
        };

        let response = match upstream {
            Some(upstream) => annotate(upstream.map(Body::new), served_by),
            None => all_backends_offline(served_by),
        };

        metrics::record_request(&method, response.status().as_u16(), served_by.as_str(), start);
        response
    }
}

/// Stamp provenance and (re)apply the wildcard allow-origin.
///
/// Proxied response headers may not include the CORS header, so it is
/// always overwritten here rather than trusted.
fn annotate(mut response: Response<Body>, served_by: ServedBy) -> Response<Body> {
    let headers = response.headers_mut();
    headers.insert(X_SERVED_BY, HeaderValue::from_static(served_by.as_str()));
    cors::apply_allow_origin(headers);
    response
}

/// The fixed envelope callers see when neither backend is reachable.
fn all_backends_offline(served_by: ServedBy) -> Response<Body> {
    let body = serde_json::json!({
        "error": "Service Unavailable",
        "message": "All backend services are currently offline",
    });

    let response = Response::builder()
        .status(StatusCode::SERVICE_UNAVAILABLE)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    annotate(response, served_by)
}

/// Rejection for bodies above the buffering cap.
fn payload_too_large() -> Response<Body> {
    let body = serde_json::json!({
        "error": "Payload Too Large",
        "message": "Request body exceeds the configured limit",
    });

    let mut response = Response::builder()
        .status(StatusCode::PAYLOAD_TOO_LARGE)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    cors::apply_allow_origin(response.headers_mut());
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_envelope_is_exact() {
        let response = all_backends_offline(ServedBy::Fallback);
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        assert_eq!(response.headers().get(X_SERVED_BY).unwrap(), "fallback");

        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(
            body,
            r#"{"error":"Service Unavailable","message":"All backend services are currently offline"}"#
        );
    }

    #[test]
    fn test_annotate_overwrites_cors_and_sets_provenance() {
        let upstream = Response::builder()
            .status(StatusCode::OK)
            .header("access-control-allow-origin", "https://stale.example.com")
            .body(Body::empty())
            .unwrap();

        let response = annotate(upstream, ServedBy::FallbackEmergency);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
        assert_eq!(response.headers().get(X_SERVED_BY).unwrap(), "fallback-emergency");
    }
}
