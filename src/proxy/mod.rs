//! Failover routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (from http::server)
//!     → router.rs consults health::monitor for the primary
//!     → planned target = primary if healthy, else fallback
//!     → forward.rs rewrites URI/Host and forwards (bounded)
//!     → transport failure from the primary: one emergency retry
//!       against the fallback
//!     → both unreachable: synthesized 503 envelope
//!     → response tagged with X-Served-By and CORS headers
//! ```
//!
//! # Design Decisions
//! - Application statuses (4xx/5xx) pass through and never trigger failover
//! - Exactly one emergency retry, no backoff, no queuing
//! - The fallback is never pre-checked; it proves itself at forward time

pub mod backend;
pub mod forward;
pub mod router;

pub use backend::{BackendRole, BackendSet, BackendTarget, ServedBy};
pub use router::FailoverRouter;
