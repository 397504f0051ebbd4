//! On-demand health probing with a TTL cache.
//!
//! # Responsibilities
//! - Answer liveness queries from the router without failing
//! - Probe at most once per TTL window per backend
//! - Classify probe outcomes (2xx = healthy, anything else = unhealthy)

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::Request;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::health::cache::HealthCache;
use crate::health::clock::Clock;
use crate::observability::metrics;
use crate::proxy::backend::BackendTarget;

pub struct HealthMonitor {
    cache: HealthCache,
    clock: Arc<dyn Clock>,
    client: Client<HttpConnector, Body>,
    probe_timeout: Duration,
    probe_path: String,
}

impl HealthMonitor {
    pub fn new(config: &HealthCheckConfig, clock: Arc<dyn Clock>) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());

        Self {
            cache: HealthCache::new(Duration::from_millis(config.ttl_ms)),
            clock,
            client,
            probe_timeout: Duration::from_millis(config.timeout_ms),
            probe_path: config.path.clone(),
        }
    }

    /// Cached or freshly probed liveness verdict for `target`.
    ///
    /// Never fails: an unreachable backend is an unhealthy backend. The
    /// verdict is stamped with the pre-probe timestamp, so the TTL window
    /// starts when the probe was decided on.
    pub async fn is_healthy(&self, target: &BackendTarget) -> bool {
        let now = self.clock.now();
        if let Some(verdict) = self.cache.fresh_verdict(target.role, now) {
            return verdict;
        }

        let healthy = self.probe(target).await;
        self.cache.record(target.role, healthy, now);
        metrics::record_probe(target.role, healthy);
        healthy
    }

    async fn probe(&self, target: &BackendTarget) -> bool {
        let uri_string = format!(
            "{}{}",
            target.base_url.as_str().trim_end_matches('/'),
            self.probe_path
        );

        let request = match Request::builder()
            .method("GET")
            .uri(uri_string)
            .header("user-agent", "failover-proxy-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(backend = %target.role, error = %e, "Failed to build health probe request");
                return false;
            }
        };

        match time::timeout(self.probe_timeout, self.client.request(request)).await {
            Ok(Ok(response)) => {
                let success = response.status().is_success();
                if !success {
                    tracing::warn!(
                        backend = %target.role,
                        status = %response.status(),
                        "Health probe failed: non-success status"
                    );
                }
                success
            }
            Ok(Err(e)) => {
                tracing::warn!(backend = %target.role, error = %e, "Health probe failed: connection error");
                false
            }
            Err(_) => {
                tracing::warn!(backend = %target.role, "Health probe failed: timeout");
                false
            }
        }
    }
}
