//! Request identity.
//!
//! # Responsibilities
//! - Stamp a unique request ID (UUID v4) as early as possible
//! - Preserve IDs supplied by the caller
//! - Let the forwarded headers carry the ID to the backends
//!
//! # Design Decisions
//! - The ID lives in the request headers, so pass-through forwarding
//!   propagates it upstream with no extra plumbing

use axum::body::Body;
use axum::http::{HeaderValue, Request};
use tower::{Layer, Service};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Tower layer that stamps `x-request-id` onto inbound requests.
#[derive(Debug, Clone, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S> Service<Request<Body>> for RequestIdService<S>
where
    S: Service<Request<Body>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        if !request.headers().contains_key(X_REQUEST_ID) {
            let id = Uuid::new_v4().to_string();
            if let Ok(value) = HeaderValue::from_str(&id) {
                request.headers_mut().insert(X_REQUEST_ID, value);
            }
        }
        self.inner.call(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::{service_fn, ServiceExt};

    async fn echo_id(request: Request<Body>) -> Result<Option<String>, Infallible> {
        Ok(request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(String::from))
    }

    #[tokio::test]
    async fn test_id_generated_when_absent() {
        let service = RequestIdLayer.layer(service_fn(echo_id));
        let request = Request::builder().body(Body::empty()).unwrap();

        let id = service.oneshot(request).await.unwrap().unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_caller_id_preserved() {
        let service = RequestIdLayer.layer(service_fn(echo_id));
        let request = Request::builder()
            .header(X_REQUEST_ID, "caller-chose-this")
            .body(Body::empty())
            .unwrap();

        let id = service.oneshot(request).await.unwrap().unwrap();
        assert_eq!(id, "caller-chose-this");
    }
}
