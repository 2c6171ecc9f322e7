//! HTTP route handlers

use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::allocator::Inconsistency;
use crate::error::{Error, Result};
use crate::ledger::TicketId;
use crate::model::{NewSlot, Slot, SlotId, SlotUpdate};
use crate::server::AppState;
use crate::workflow::{
    Availability, EntryRequest, ExitRequest, FareResponse, ReceiptResponse, TicketResponse,
};
use crate::ParkingService;

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub timestamp: chrono::DateTime<Utc>,
    pub status: u16,
    pub error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorResponse {
            timestamp: Utc::now(),
            status: status.as_u16(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Unwrap a JSON body, reporting malformed input as a bad request
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::InvalidArgument(rejection.body_text()))
}

/// Run a service call on the blocking pool
///
/// Service calls take the allocator and ledger locks, which must not be
/// held on a runtime worker.
async fn blocking<T, F>(state: &AppState, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ParkingService) -> Result<T> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    tokio::task::spawn_blocking(move || f(&service))
        .await
        .map_err(|e| Error::Storage(format!("Worker task failed: {}", e)))?
}

/// Admit a vehicle through an entry gate
#[instrument(skip(state, payload))]
pub async fn vehicle_entry(
    Extension(state): Extension<Arc<AppState>>,
    payload: std::result::Result<Json<EntryRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TicketResponse>)> {
    let request = body(payload)?;
    info!(
        plate = %request.plate_no,
        gate = %request.entry_gate,
        vehicle_type = %request.vehicle_type,
        "Vehicle entry"
    );

    let ticket = blocking(&state, move |s| s.enter(request)).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// Quote the fare for an active ticket
#[instrument(skip(state))]
pub async fn calculate_fare(
    Extension(state): Extension<Arc<AppState>>,
    Path(ticket_id): Path<u64>,
) -> Result<Json<FareResponse>> {
    Ok(Json(
        blocking(&state, move |s| s.quote_fare(TicketId(ticket_id))).await?,
    ))
}

/// Settle payment and let the vehicle out
#[instrument(skip(state, payload))]
pub async fn vehicle_exit(
    Extension(state): Extension<Arc<AppState>>,
    payload: std::result::Result<Json<ExitRequest>, JsonRejection>,
) -> Result<Json<ReceiptResponse>> {
    let request = body(payload)?;
    info!(ticket = %request.ticket_id, amount = request.amount, "Vehicle exit");
    Ok(Json(blocking(&state, move |s| s.exit(request)).await?))
}

#[instrument(skip(state))]
pub async fn availability(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Availability>>> {
    Ok(Json(blocking(&state, |s| s.availability()).await?))
}

#[instrument(skip(state))]
pub async fn list_slots(Extension(state): Extension<Arc<AppState>>) -> Result<Json<Vec<Slot>>> {
    Ok(Json(blocking(&state, |s| s.list_slots()).await?))
}

#[instrument(skip(state))]
pub async fn get_slot(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Slot>> {
    Ok(Json(blocking(&state, move |s| s.get_slot(SlotId(id))).await?))
}

#[instrument(skip(state, payload))]
pub async fn add_slot(
    Extension(state): Extension<Arc<AppState>>,
    payload: std::result::Result<Json<NewSlot>, JsonRejection>,
) -> Result<(StatusCode, Json<Slot>)> {
    let new = body(payload)?;
    let slot = blocking(&state, move |s| s.add_slot(new)).await?;
    Ok((StatusCode::CREATED, Json(slot)))
}

#[instrument(skip(state, payload))]
pub async fn update_slot(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<u64>,
    payload: std::result::Result<Json<SlotUpdate>, JsonRejection>,
) -> Result<Json<Slot>> {
    let update = body(payload)?;
    Ok(Json(
        blocking(&state, move |s| s.update_slot(SlotId(id), update)).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_slot(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<Json<Slot>> {
    Ok(Json(blocking(&state, move |s| s.delete_slot(SlotId(id))).await?))
}

/// Consistency report
#[derive(Debug, Serialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub problems: Vec<Inconsistency>,
}

#[instrument(skip(state))]
pub async fn index_consistency(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<ConsistencyReport>> {
    let problems = blocking(&state, |s| s.check_consistency()).await?;
    if !problems.is_empty() {
        warn!(problems = problems.len(), "Slot index disagrees with directory");
    }
    Ok(Json(ConsistencyReport {
        consistent: problems.is_empty(),
        problems,
    }))
}

/// Force a rebuild of the index from the directory
#[instrument(skip(state))]
pub async fn rebuild_index(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<Availability>>> {
    let availability = blocking(&state, |s| {
        s.allocator().refresh()?;
        s.availability()
    })
    .await?;
    Ok(Json(availability))
}
