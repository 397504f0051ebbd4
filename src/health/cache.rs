//! TTL-bounded liveness verdict cache.
//!
//! # Responsibilities
//! - Hold one health record per backend role, for the process lifetime
//! - Answer whether a cached verdict is still trustworthy
//! - Overwrite records whole (both fields under one lock)
//!
//! # Design Decisions
//! - A verdict produced at T is authoritative until T + TTL; after that
//!   callers must probe before trusting the record again
//! - This is a staleness bound, not a concurrency lock: requests racing
//!   to re-probe settle on last-probe-wins, which costs at most one
//!   redundant probe and never a wrong routing decision

use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::proxy::backend::BackendRole;

/// Cached liveness verdict for one backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthRecord {
    /// Last known verdict.
    pub healthy: bool,
    /// When the verdict was produced. `None` until the first probe lands.
    pub checked_at: Option<Instant>,
}

impl HealthRecord {
    /// Pre-probe record: optimistic but immediately stale, so the first
    /// consult always probes.
    fn optimistic() -> Self {
        Self {
            healthy: true,
            checked_at: None,
        }
    }
}

/// Per-role health records with a freshness policy.
#[derive(Debug)]
pub struct HealthCache {
    ttl: Duration,
    primary: Mutex<HealthRecord>,
    fallback: Mutex<HealthRecord>,
}

impl HealthCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            primary: Mutex::new(HealthRecord::optimistic()),
            fallback: Mutex::new(HealthRecord::optimistic()),
        }
    }

    fn slot(&self, role: BackendRole) -> &Mutex<HealthRecord> {
        match role {
            BackendRole::Primary => &self.primary,
            BackendRole::Fallback => &self.fallback,
        }
    }

    /// The cached verdict, if it is younger than the TTL.
    pub fn fresh_verdict(&self, role: BackendRole, now: Instant) -> Option<bool> {
        let record = *self.slot(role).lock().unwrap();
        match record.checked_at {
            Some(at) if now.duration_since(at) < self.ttl => Some(record.healthy),
            _ => None,
        }
    }

    /// Record a completed probe, unconditionally replacing the old verdict.
    pub fn record(&self, role: BackendRole, healthy: bool, now: Instant) {
        let mut record = self.slot(role).lock().unwrap();
        *record = HealthRecord {
            healthy,
            checked_at: Some(now),
        };
    }

    /// Current record, for logging.
    pub fn snapshot(&self, role: BackendRole) -> HealthRecord {
        *self.slot(role).lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(60_000);

    #[test]
    fn test_unprobed_record_is_never_fresh() {
        let cache = HealthCache::new(TTL);
        let now = Instant::now();

        assert_eq!(cache.fresh_verdict(BackendRole::Primary, now), None);
        assert!(cache.snapshot(BackendRole::Primary).healthy);
    }

    #[test]
    fn test_verdict_fresh_within_ttl() {
        let cache = HealthCache::new(TTL);
        let probed = Instant::now();
        cache.record(BackendRole::Primary, false, probed);

        let just_before_expiry = probed + TTL - Duration::from_millis(1);
        assert_eq!(cache.fresh_verdict(BackendRole::Primary, just_before_expiry), Some(false));
    }

    #[test]
    fn test_verdict_stale_after_ttl() {
        let cache = HealthCache::new(TTL);
        let probed = Instant::now();
        cache.record(BackendRole::Primary, true, probed);

        assert_eq!(cache.fresh_verdict(BackendRole::Primary, probed + TTL), None);
    }

    #[test]
    fn test_last_probe_wins() {
        let cache = HealthCache::new(TTL);
        let now = Instant::now();
        cache.record(BackendRole::Fallback, true, now);
        cache.record(BackendRole::Fallback, false, now + Duration::from_millis(5));

        assert_eq!(
            cache.fresh_verdict(BackendRole::Fallback, now + Duration::from_millis(10)),
            Some(false)
        );
    }

    #[test]
    fn test_roles_are_independent() {
        let cache = HealthCache::new(TTL);
        let now = Instant::now();
        cache.record(BackendRole::Primary, false, now);

        assert_eq!(cache.fresh_verdict(BackendRole::Primary, now), Some(false));
        assert_eq!(cache.fresh_verdict(BackendRole::Fallback, now), None);
    }
}
