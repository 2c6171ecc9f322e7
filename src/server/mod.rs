//! Parkgate HTTP server
//!
//! axum front end over [`ParkingService`]. Handlers are thin: they decode
//! the request, call the service and map [`Error`](crate::error::Error)
//! to a status code.

pub mod handlers;
pub mod middleware;
pub mod routes;

use axum::{extract::Extension, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::config::ServerSettings;
use crate::workflow::ParkingService;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP server bind address
    pub http_addr: String,
    /// HTTP port
    pub http_port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerSettings::default().into()
    }
}

impl From<ServerSettings> for ServerConfig {
    fn from(settings: ServerSettings) -> Self {
        Self {
            http_addr: settings.bind,
            http_port: settings.port,
            enable_cors: settings.enable_cors,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ParkingService>,
    pub config: ServerConfig,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    pub fn new(service: Arc<ParkingService>, config: ServerConfig) -> Self {
        Self { service, config }
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let enable_cors = state.config.enable_cors;

    let app = Router::new()
        .merge(routes::parking_routes())
        .merge(routes::admin_routes())
        .merge(routes::health_routes())
        .layer(axum::middleware::from_fn(middleware::log_request))
        .layer(Extension(Arc::new(state)))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new());

    if enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Start the Parkgate server
///
/// The service must already be bootstrapped; its index is built before
/// the listener is bound.
pub async fn start_server(config: ServerConfig, service: Arc<ParkingService>) -> anyhow::Result<()> {
    info!(
        addr = %config.http_addr,
        port = config.http_port,
        "Starting Parkgate HTTP server"
    );

    crate::metrics::init_metrics();

    let addr = format!("{}:{}", config.http_addr, config.http_port);
    let app = router(AppState::new(service, config));
    let listener = TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Metrics: http://{}/_metrics", addr);
    info!("Health: http://{}/health", addr);

    axum::serve(listener, app).await.map_err(|e| {
        error!(error = %e, "Server error");
        anyhow::anyhow!("Server failed: {}", e)
    })
}
