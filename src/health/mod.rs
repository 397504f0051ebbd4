//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Router consults monitor.rs per request:
//!     cache.rs verdict fresh?
//!     → yes: return cached verdict, no network call
//!     → no: probe GET {base_url}{path} (bounded)
//!         → classify (2xx = healthy, anything else = unhealthy)
//!         → overwrite cache.rs record (last probe wins)
//! ```
//!
//! # Design Decisions
//! - Probes are request-driven, not periodic; the TTL caps probe rate
//! - A failed or timed-out probe is a definitive unhealthy verdict and
//!   restarts the TTL window, so a dead backend is not hammered
//! - Wall-clock reads go through clock.rs so tests can substitute a
//!   manual clock

pub mod cache;
pub mod clock;
pub mod monitor;

pub use cache::{HealthCache, HealthRecord};
pub use clock::{Clock, SystemClock};
pub use monitor::HealthMonitor;
