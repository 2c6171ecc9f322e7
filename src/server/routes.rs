//! HTTP routes definition

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::{handlers, AppState};

/// Entry/exit routes
///
/// - POST /api/parking/entry             - Admit a vehicle
/// - GET  /api/parking/fare/:ticket_id   - Quote fare, record pending payment
/// - POST /api/parking/exit              - Pay and leave
/// - GET  /api/parking/availability      - Free slots per vehicle type
pub fn parking_routes() -> Router {
    Router::new()
        .route("/api/parking/entry", post(handlers::vehicle_entry))
        .route("/api/parking/fare/:ticket_id", get(handlers::calculate_fare))
        .route("/api/parking/exit", post(handlers::vehicle_exit))
        .route("/api/parking/availability", get(handlers::availability))
}

/// Slot administration routes
///
/// - GET    /api/admin/slots              - List slots
/// - POST   /api/admin/slots              - Add a slot
/// - GET    /api/admin/slots/:id          - Get a slot
/// - PUT    /api/admin/slots/:id          - Update a slot
/// - DELETE /api/admin/slots/:id          - Delete a free slot
/// - GET    /api/admin/index/consistency  - Compare index with directory
/// - POST   /api/admin/index/rebuild      - Rebuild index from directory
pub fn admin_routes() -> Router {
    Router::new()
        .route(
            "/api/admin/slots",
            get(handlers::list_slots).post(handlers::add_slot),
        )
        .route(
            "/api/admin/slots/:id",
            get(handlers::get_slot)
                .put(handlers::update_slot)
                .delete(handlers::delete_slot),
        )
        .route(
            "/api/admin/index/consistency",
            get(handlers::index_consistency),
        )
        .route("/api/admin/index/rebuild", post(handlers::rebuild_index))
}

/// Health check routes
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/health/live", get(health_live))
        .route("/health/ready", get(health_ready))
        .route("/_metrics", get(metrics_endpoint))
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub ready: bool,
    pub version: &'static str,
}

fn health_status(state: &AppState) -> HealthStatus {
    let ready = state.service.allocator().is_ready();
    HealthStatus {
        status: if ready { "healthy" } else { "starting" },
        ready,
        version: crate::VERSION,
    }
}

async fn health(Extension(state): Extension<Arc<AppState>>) -> Json<HealthStatus> {
    Json(health_status(&state))
}

/// Liveness probe
async fn health_live() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe: the slot index must be built
async fn health_ready(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<HealthStatus>, (StatusCode, String)> {
    let status = health_status(&state);
    if status.ready {
        Ok(Json(status))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, "Not ready".to_string()))
    }
}

/// Prometheus metrics endpoint
async fn metrics_endpoint() -> String {
    crate::metrics::export_metrics()
}
