//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Create the Axum router with the catch-all edge handler
//! - Intercept OPTIONS preflights before they reach the failover router
//! - Wire up middleware (request ID, tracing)
//! - Serve with graceful shutdown

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::response::IntoResponse;
use axum::routing::any;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::ProxyConfig;
use crate::health::{HealthMonitor, SystemClock};
use crate::http::cors;
use crate::http::request::RequestIdLayer;
use crate::proxy::{BackendSet, FailoverRouter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<FailoverRouter>,
}

/// HTTP server for the failover edge.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new server from validated configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, url::ParseError> {
        let backends = BackendSet::from_config(&config.backends)?;
        let health = Arc::new(HealthMonitor::new(&config.health_check, Arc::new(SystemClock)));
        let failover = Arc::new(FailoverRouter::new(backends, health, &config));

        let state = AppState { router: failover };
        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(edge_handler))
            .route("/", any(edge_handler))
            .with_state(state)
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Edge entry point.
///
/// Preflights terminate here; everything else goes through the failover
/// router and comes back annotated.
async fn edge_handler(State(state): State<AppState>, request: Request<Body>) -> impl IntoResponse {
    if request.method() == Method::OPTIONS {
        return cors::preflight_response();
    }

    state.router.route(request).await
}
