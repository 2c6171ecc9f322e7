//! In-memory ledger

use super::{Payment, PaymentStatus, Ticket, TicketId, TicketLedger, TicketStatus, Vehicle};
use crate::error::{Error, Result};
use crate::model::{Slot, VehicleType};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

#[derive(Debug, Default)]
struct LedgerState {
    vehicles: HashMap<String, Vehicle>,
    tickets: BTreeMap<TicketId, Ticket>,
    /// plate → ACTIVE ticket
    active_by_plate: HashMap<String, TicketId>,
    payments: HashMap<TicketId, Payment>,
    next_ticket: u64,
}

/// Ledger held in process memory
///
/// All tables sit behind one mutex, so the duplicate-entry check and the
/// ticket insert in [`open_ticket`](TicketLedger::open_ticket) are atomic.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of tickets ever opened
    pub fn ticket_count(&self) -> usize {
        self.state.lock().tickets.len()
    }
}

impl TicketLedger for InMemoryLedger {
    fn upsert_vehicle(
        &self,
        plate_no: &str,
        vehicle_type: VehicleType,
        owner_name: Option<&str>,
    ) -> Result<Vehicle> {
        let mut state = self.state.lock();
        let vehicle = state
            .vehicles
            .entry(plate_no.to_string())
            .or_insert_with(|| Vehicle {
                plate_no: plate_no.to_string(),
                vehicle_type,
                owner_name: None,
            });
        vehicle.vehicle_type = vehicle_type;
        if let Some(owner) = owner_name {
            vehicle.owner_name = Some(owner.to_string());
        }
        Ok(vehicle.clone())
    }

    fn find_vehicle(&self, plate_no: &str) -> Result<Option<Vehicle>> {
        Ok(self.state.lock().vehicles.get(plate_no).cloned())
    }

    fn find_active_ticket(&self, plate_no: &str) -> Result<Option<Ticket>> {
        let state = self.state.lock();
        Ok(state
            .active_by_plate
            .get(plate_no)
            .and_then(|id| state.tickets.get(id))
            .cloned())
    }

    fn open_ticket(
        &self,
        vehicle: &Vehicle,
        vehicle_type: VehicleType,
        slot: &Slot,
        entry_time: DateTime<Utc>,
    ) -> Result<Ticket> {
        let mut state = self.state.lock();
        if state.active_by_plate.contains_key(&vehicle.plate_no) {
            return Err(Error::Conflict(format!(
                "Vehicle {} already inside",
                vehicle.plate_no
            )));
        }

        state.next_ticket += 1;
        let ticket = Ticket {
            id: TicketId(state.next_ticket),
            plate_no: vehicle.plate_no.clone(),
            vehicle_type,
            slot_id: slot.id,
            slot_number: slot.slot_number.clone(),
            entry_time,
            exit_time: None,
            status: TicketStatus::Active,
        };
        state
            .active_by_plate
            .insert(ticket.plate_no.clone(), ticket.id);
        state.tickets.insert(ticket.id, ticket.clone());
        debug!(ticket = %ticket.id, plate = %ticket.plate_no, "Opened ticket");
        Ok(ticket)
    }

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>> {
        Ok(self.state.lock().tickets.get(&id).cloned())
    }

    fn close_ticket(&self, id: TicketId, exit_time: DateTime<Utc>) -> Result<Ticket> {
        let mut state = self.state.lock();
        let ticket = state
            .tickets
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("{}", id)))?;
        if !ticket.is_active() {
            return Err(Error::InvalidTransition(format!("{} is not active", id)));
        }
        ticket.status = TicketStatus::Closed;
        ticket.exit_time = Some(exit_time);
        let closed = ticket.clone();
        state.active_by_plate.remove(&closed.plate_no);
        Ok(closed)
    }

    fn record_pending_payment(
        &self,
        ticket_id: TicketId,
        amount: u64,
        at: DateTime<Utc>,
    ) -> Result<Payment> {
        let mut state = self.state.lock();
        if !state.tickets.contains_key(&ticket_id) {
            return Err(Error::NotFound(format!("{}", ticket_id)));
        }
        if let Some(existing) = state.payments.get(&ticket_id) {
            if existing.status == PaymentStatus::Success {
                return Err(Error::InvalidTransition(format!(
                    "{} is already paid",
                    ticket_id
                )));
            }
        }
        let payment = Payment {
            ticket_id,
            amount,
            timestamp: at,
            status: PaymentStatus::Pending,
        };
        state.payments.insert(ticket_id, payment.clone());
        Ok(payment)
    }

    fn find_payment(&self, ticket_id: TicketId) -> Result<Option<Payment>> {
        Ok(self.state.lock().payments.get(&ticket_id).cloned())
    }

    fn confirm_payment(&self, ticket_id: TicketId, at: DateTime<Utc>) -> Result<Payment> {
        let mut state = self.state.lock();
        let payment = state
            .payments
            .get_mut(&ticket_id)
            .ok_or_else(|| Error::NotFound(format!("Payment for {}", ticket_id)))?;
        if payment.status != PaymentStatus::Pending {
            return Err(Error::InvalidTransition(format!(
                "Payment for {} is not pending",
                ticket_id
            )));
        }
        payment.status = PaymentStatus::Success;
        payment.timestamp = at;
        Ok(payment.clone())
    }

    fn settle_exit(
        &self,
        ticket_id: TicketId,
        offered: u64,
        at: DateTime<Utc>,
    ) -> Result<(Ticket, Payment)> {
        let mut state = self.state.lock();
        let LedgerState {
            tickets,
            payments,
            active_by_plate,
            ..
        } = &mut *state;

        let ticket = tickets
            .get_mut(&ticket_id)
            .ok_or_else(|| Error::NotFound(format!("{}", ticket_id)))?;
        if !ticket.is_active() {
            return Err(Error::InvalidTransition(format!(
                "{} is not active",
                ticket_id
            )));
        }
        let payment = payments
            .get_mut(&ticket_id)
            .filter(|p| p.status == PaymentStatus::Pending)
            .ok_or_else(|| {
                Error::InvalidTransition("No pending payment found for this ticket".to_string())
            })?;
        if offered < payment.amount {
            return Err(Error::InsufficientPayment {
                required: payment.amount,
                offered,
            });
        }

        payment.status = PaymentStatus::Success;
        payment.timestamp = at;
        ticket.status = TicketStatus::Closed;
        ticket.exit_time = Some(at);
        active_by_plate.remove(&ticket.plate_no);
        debug!(ticket = %ticket_id, "Settled exit");
        Ok((ticket.clone(), payment.clone()))
    }

    fn active_tickets(&self) -> Result<Vec<Ticket>> {
        let state = self.state.lock();
        Ok(state
            .tickets
            .values()
            .filter(|t| t.is_active())
            .cloned()
            .collect())
    }
}
