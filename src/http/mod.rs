//! HTTP edge subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all dispatch)
//!     → OPTIONS: answered locally with preflight headers (cors.rs)
//!     → everything else: proxy::FailoverRouter
//!     → response returned with provenance + CORS headers
//! ```

pub mod cors;
pub mod request;
pub mod server;

pub use request::{RequestIdLayer, X_REQUEST_ID};
pub use server::HttpServer;
