//! HTTP front end for the todo store.
//!
//! # Design
//! The store is built once in `main` and handed to `app` inside `AppState`;
//! handlers reach it only through the state. Store calls are synchronous and
//! run on tokio's blocking pool. Every matched request passes through
//! `track_requests`, which logs it and feeds the metrics counters.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::HeaderValue;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;

pub use config::{Config, ConfigError};
pub use error::ApiError;
pub use metrics::Metrics;

use todo_store::TodoStore;

/// Name and version reported by the health endpoint.
#[derive(Debug, Clone)]
pub struct AppInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<TodoStore>,
    pub metrics: Arc<Metrics>,
    pub info: Arc<AppInfo>,
}

impl AppState {
    /// Fails only if the metrics registry rejects a collector.
    pub fn new(store: TodoStore, config: &Config) -> Result<Self, prometheus::Error> {
        Ok(Self {
            store: Arc::new(store),
            metrics: Arc::new(Metrics::new()?),
            info: Arc::new(AppInfo {
                name: config.app_name.clone(),
                version: config.app_version.clone(),
            }),
        })
    }
}

pub fn app(state: AppState, config: &Config) -> Router {
    let mut router: Router<AppState> = Router::new()
        .route(
            "/api/todos",
            get(handlers::list_todos).post(handlers::create_todo),
        )
        .route(
            "/api/todos/{id}",
            get(handlers::get_todo)
                .put(handlers::update_todo)
                .delete(handlers::delete_todo),
        )
        .route("/api/stats", get(handlers::stats))
        .route("/health", get(handlers::health))
        .route("/api/health", get(handlers::health));

    if config.enable_metrics {
        router = router.route("/metrics", get(handlers::metrics));
    }

    router
        .route_service("/", ServeFile::new(config.static_dir.join("index.html")))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .route_layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .layer(cors_layer(&config.cors_origins))
        .with_state(state)
}

pub async fn run(
    listener: TcpListener,
    state: AppState,
    config: &Config,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state, config))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    log::info!("shutdown signal received");
}

async fn track_requests(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    state
        .metrics
        .observe_request(method.as_str(), &route, status, elapsed);
    log::info!("{method} {route} {status} {elapsed:?}");
    response
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins {
        match HeaderValue::from_str(origin) {
            Ok(value) => allowed.push(value),
            Err(_) => log::warn!("ignoring invalid CORS origin {origin:?}"),
        }
    }
    layer.allow_origin(AllowOrigin::list(allowed))
}
