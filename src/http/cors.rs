//! Cross-origin headers for the edge.
//!
//! # Responsibilities
//! - Answer OPTIONS preflights locally, without contacting a backend
//! - Re-apply the wildcard allow-origin on outgoing responses, since
//!   backend headers may not include it

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Response};

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, x-api-key";
pub const MAX_AGE_SECS: &str = "86400";

/// Overwrite the wildcard allow-origin on an outgoing response.
pub fn apply_allow_origin(headers: &mut HeaderMap) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
}

/// The full local answer to a CORS preflight: 200, empty body.
pub fn preflight_response() -> Response<Body> {
    let mut response = Response::new(Body::empty());
    let headers = response.headers_mut();
    apply_allow_origin(headers);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static(MAX_AGE_SECS),
    );
    response
}
