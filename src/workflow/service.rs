//! Entry/exit workflow

use super::dto::{
    Availability, EntryRequest, ExitRequest, FareResponse, ReceiptResponse, TicketResponse,
};
use crate::allocator::SlotAllocator;
use crate::config::Settings;
use crate::distance::DistanceTable;
use crate::error::{Error, Result};
use crate::ledger::{InMemoryLedger, TicketId, TicketLedger};
use crate::pricing::{FarePolicy, HourlyRatePolicy};
use crate::storage::{load_slots, InMemorySlotDirectory, SlotDirectory};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Orchestrates vehicle entry and exit around the slot allocator
pub struct ParkingService {
    pub(super) allocator: Arc<SlotAllocator>,
    pub(super) ledger: Arc<dyn TicketLedger>,
    pricing: Arc<dyn FarePolicy>,
}

impl fmt::Debug for ParkingService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParkingService")
            .field("allocator", &self.allocator)
            .finish()
    }
}

impl ParkingService {
    pub fn new(
        allocator: Arc<SlotAllocator>,
        ledger: Arc<dyn TicketLedger>,
        pricing: Arc<dyn FarePolicy>,
    ) -> Self {
        Self {
            allocator,
            ledger,
            pricing,
        }
    }

    /// Boot sequence: distances, slots, strict index build
    ///
    /// Any slot without a distance from every gate aborts with
    /// `MissingDistance`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let distances = Arc::new(DistanceTable::load(&settings.data.distances_path)?);
        let directory: Arc<dyn SlotDirectory> = Arc::new(InMemorySlotDirectory::seeded(
            load_slots(&settings.data.slots_path)?,
        )?);
        let allocator = Arc::new(SlotAllocator::bootstrap(directory, distances)?);

        Ok(Self::new(
            allocator,
            Arc::new(InMemoryLedger::new()),
            Arc::new(HourlyRatePolicy::new(settings.pricing.clone())),
        ))
    }

    pub fn allocator(&self) -> &Arc<SlotAllocator> {
        &self.allocator
    }

    pub fn ledger(&self) -> &Arc<dyn TicketLedger> {
        &self.ledger
    }

    /// Admit a vehicle: duplicate check, allocation, ticket
    pub fn enter(&self, request: EntryRequest) -> Result<TicketResponse> {
        let plate_no = normalize_plate(&request.plate_no)?;

        if self.ledger.find_active_ticket(&plate_no)?.is_some() {
            return Err(Error::Conflict(format!("Vehicle {} already inside", plate_no)));
        }

        let slot = self
            .allocator
            .allocate(request.entry_gate, request.vehicle_type)?;

        let opened = self
            .ledger
            .upsert_vehicle(
                &plate_no,
                request.vehicle_type,
                request.owner_name.as_deref(),
            )
            .and_then(|vehicle| {
                self.ledger
                    .open_ticket(&vehicle, request.vehicle_type, &slot, Utc::now())
            });
        let ticket = match opened {
            Ok(ticket) => ticket,
            Err(e) => {
                // Hand the slot back before reporting the failure.
                if let Err(release_err) = self.allocator.release(slot.id) {
                    error!(
                        slot = %slot.slot_number,
                        error = %release_err,
                        "Failed to release slot after aborted entry"
                    );
                }
                return Err(e);
            }
        };

        let distance = self
            .allocator
            .distances()
            .lookup_or_default(request.entry_gate, &slot.slot_number);
        info!(
            ticket = %ticket.id,
            plate = %plate_no,
            slot = %slot.slot_number,
            gate = %request.entry_gate,
            "Vehicle entered"
        );

        Ok(TicketResponse {
            ticket_id: ticket.id,
            plate_no,
            slot_number: slot.slot_number,
            floor_number: slot.floor_number,
            entry_gate: request.entry_gate,
            distance,
            entry_time: ticket.entry_time,
        })
    }

    /// Compute the fare owed now and record it as a pending payment
    pub fn quote_fare(&self, ticket_id: TicketId) -> Result<FareResponse> {
        self.quote_fare_at(ticket_id, Utc::now())
    }

    pub fn quote_fare_at(&self, ticket_id: TicketId, at: DateTime<Utc>) -> Result<FareResponse> {
        let ticket = self
            .ledger
            .get_ticket(ticket_id)?
            .ok_or_else(|| Error::NotFound(format!("{}", ticket_id)))?;
        if !ticket.is_active() {
            return Err(Error::InvalidTransition(format!("{} is not active", ticket_id)));
        }

        let minutes = (at - ticket.entry_time).num_minutes().max(0);
        let amount = self.pricing.fare(ticket.vehicle_type, minutes)?;
        self.ledger.record_pending_payment(ticket_id, amount, at)?;

        Ok(FareResponse {
            ticket_id,
            plate_no: ticket.plate_no,
            duration_minutes: minutes,
            amount,
        })
    }

    /// Settle the pending payment, close the ticket and free the slot
    pub fn exit(&self, request: ExitRequest) -> Result<ReceiptResponse> {
        self.exit_at(request, Utc::now())
    }

    pub fn exit_at(&self, request: ExitRequest, at: DateTime<Utc>) -> Result<ReceiptResponse> {
        // Settling closes the ticket; only the caller that closed it may
        // release the slot.
        let (closed, payment) = self
            .ledger
            .settle_exit(request.ticket_id, request.amount, at)?;

        let slot_freed = match self.allocator.release(closed.slot_id) {
            Ok(_) => true,
            Err(e @ (Error::InvalidTransition(_) | Error::NotFound(_))) => {
                warn!(
                    ticket = %closed.id,
                    slot = %closed.slot_number,
                    error = %e,
                    "Slot was no longer held by this ticket"
                );
                false
            }
            Err(e) => {
                error!(
                    ticket = %closed.id,
                    slot = %closed.slot_number,
                    error = %e,
                    "Ticket closed but slot could not be released"
                );
                return Err(e);
            }
        };

        info!(
            ticket = %closed.id,
            plate = %closed.plate_no,
            slot = %closed.slot_number,
            amount = payment.amount,
            "Vehicle exited"
        );

        Ok(ReceiptResponse {
            ticket_id: closed.id,
            plate_no: closed.plate_no,
            slot_number: closed.slot_number,
            exit_time: at,
            payment_status: payment.status,
            amount_due: payment.amount,
            paid_amount: request.amount,
            remaining_change: request.amount - payment.amount,
            slot_freed,
            message: "Exit successful, visit again. Thank you!".to_string(),
        })
    }

    /// Free slots per vehicle type
    pub fn availability(&self) -> Result<Vec<Availability>> {
        Ok(self
            .allocator
            .availability()?
            .into_iter()
            .map(|(vehicle_type, free_slots)| Availability {
                vehicle_type,
                free_slots,
            })
            .collect())
    }
}

fn normalize_plate(plate_no: &str) -> Result<String> {
    let plate = plate_no.trim().to_ascii_uppercase();
    if plate.is_empty() {
        return Err(Error::InvalidArgument("Plate number is required".to_string()));
    }
    Ok(plate)
}
