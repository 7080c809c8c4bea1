//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the registry endpoints and the proxy fallback
//! - Wire up middleware (tracing, request ID, timeout, body limit, CORS, security headers)
//! - Register startup instances and spawn the health monitor
//! - Dispatch unmatched paths to the route table and the forwarder

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::error::{ApiError, GatewayError};
use crate::health::HealthMonitor;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::services;
use crate::load_balancer::Selector;
use crate::observability::metrics;
use crate::proxy::Forwarder;
use crate::registry::{Registry, TracingObserver};
use crate::routing::Router as RouteTable;
use crate::security::auth::{guard_from_config, RequestGuard};
use crate::security::headers::security_header_layers;
use crate::security::limits::{body_limit_layer, cors_layer};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub forwarder: Arc<Forwarder>,
    pub monitor: Arc<HealthMonitor>,
    pub routes: Arc<RouteTable>,
    pub guard: Arc<dyn RequestGuard>,
    /// Development mode: error detail is included in client payloads.
    pub expose_errors: bool,
}

impl AppState {
    pub fn api_error(&self, error: GatewayError) -> ApiError {
        ApiError::new(error, self.expose_errors)
    }
}

/// HTTP server for the gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    registry: Arc<Registry>,
    monitor: Arc<HealthMonitor>,
}

impl GatewayServer {
    /// Create a new server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let registry = Arc::new(Registry::new());
        registry.subscribe(Arc::new(TracingObserver));

        for service in &config.services {
            if let Err(e) = registry.register(&service.name, &service.url) {
                tracing::warn!(service = %service.name, url = %service.url, error = %e, "Skipping startup registration");
            }
        }

        let selector = Selector::new(registry.clone(), config.load_balancing.strategy);
        let forwarder = Arc::new(Forwarder::new(selector, &config.timeouts));
        let monitor = Arc::new(HealthMonitor::new(registry.clone(), &config.health_check));

        let state = AppState {
            registry: registry.clone(),
            forwarder,
            monitor: monitor.clone(),
            routes: Arc::new(RouteTable::from_config(&config.routes)),
            guard: Arc::from(guard_from_config(&config.security)),
            expose_errors: config.mode.is_development(),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
            monitor,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route("/health", get(services::gateway_health))
            .route("/services", get(services::list_services))
            .route("/services/register", post(services::register_service))
            .route("/services/health/{name}", post(services::report_health))
            .route("/services/{name}/health", get(services::check_service_health))
            .route("/services/{name}/{id}", delete(services::unregister_service))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(body_limit_layer(&config.security))
            .layer(TimeoutLayer::new(
                config.timeouts.request() + config.timeouts.connect(),
            ));

        if config.security.enable_headers {
            for layer in security_header_layers() {
                router = router.layer(layer);
            }
        }
        if let Some(cors) = cors_layer(&config.security) {
            router = router.layer(cors);
        }

        router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
    }

    /// Run the server until `shutdown` fires, with the health monitor alongside.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            strategy = %self.config.load_balancing.strategy,
            mode = ?self.config.mode,
            "HTTP server starting"
        );

        let monitor_task = if self.config.health_check.enabled {
            Some(self.monitor.spawn(shutdown.resubscribe()))
        } else {
            tracing::info!("Active health checks disabled");
            None
        };

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        if let Some(task) = monitor_task {
            if served.is_err() {
                task.abort();
            }
            let _ = task.await;
        }

        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Shared registry, for registering instances before or while serving.
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// The health monitor, for running probe cycles on demand.
    pub fn monitor(&self) -> Arc<HealthMonitor> {
        self.monitor.clone()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Proxy handler for every path not claimed by the gateway's own endpoints.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let started = Instant::now();
    let request_id = request_id(request.headers()).to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let Some(route) = state.routes.match_path(&path) else {
        tracing::debug!(request_id = %request_id, path = %path, "No route matched");
        return state.api_error(GatewayError::RouteNotFound).into_response();
    };

    if route.protected {
        if let Err(e) = state.guard.check(request.headers()) {
            tracing::debug!(request_id = %request_id, route = %route.name, "Guard rejected request");
            return state.api_error(e).into_response();
        }
    }

    let upstream_path = route.rewrite(&path, request.uri().query());
    let service = route.service.clone();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        service = %service,
        upstream_path = %upstream_path,
        "Proxying request"
    );

    let response = match state
        .forwarder
        .forward(request, &service, &upstream_path, peer.ip())
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(request_id = %request_id, service = %service, error = %e, "Forwarding failed");
            state.api_error(e).into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), &service, started);
    response
}
