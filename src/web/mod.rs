//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::Config;
use crate::store::StateStore;

use axum::{
    extract::{ConnectInfo, DefaultBodyLimit, Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<StateStore>,
}

/// Web server for botwatch.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: Config, store: Arc<StateStore>) -> Self {
        Self {
            state: AppState { config, store },
        }
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = router(self.state.clone());

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;

        Ok(())
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        // Pages
        .route("/", get(handlers::handle_dashboard))
        .route("/admin", get(handlers::handle_admin))
        // API endpoints
        .route("/api/ping", get(handlers::handle_ping))
        .route("/api/bots", get(handlers::handle_get_bots))
        .route("/api/bots/{id}", put(handlers::handle_update_bot))
        .route("/api/visitors", get(handlers::handle_get_visitors))
        // Static assets
        .route("/favicon.ico", get(handlers::handle_favicon))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_visitor,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
        .with_state(state)
}

/// Record every inbound request in the visitor log.
///
/// Prefers the first `x-forwarded-for` entry over the peer address. The
/// store skips loopback addresses and never fails, so this cannot block or
/// reject the request.
async fn track_visitor(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let ip = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| addr.ip().to_string());

    let user_agent = request
        .headers()
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    state.store.record_visit(&ip, user_agent);
    next.run(request).await
}

/// Bind the router on an ephemeral port and return its base URL.
#[cfg(test)]
pub(crate) async fn spawn_test_server() -> (String, Arc<StateStore>) {
    let store = Arc::new(StateStore::new());
    store.list_bots();

    let state = AppState {
        config: Config::default(),
        store: store.clone(),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    (format!("http://{}", addr), store)
}
