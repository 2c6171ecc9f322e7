//! Ticket, vehicle and payment ledger
//!
//! Records entry/exit events and fare settlement. The entry/exit workflow
//! uses it to validate state transitions; the allocator never touches it.
//!
//! ```text
//! Vehicle (plate) ──1:n──▶ Ticket (ACTIVE → CLOSED) ──1:1──▶ Payment (PENDING → SUCCESS)
//! ```

pub mod memory;

use crate::error::Result;
use crate::model::{Slot, SlotId, VehicleType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use memory::InMemoryLedger;

/// Ticket identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(pub u64);

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ticket#{}", self.0)
    }
}

/// A registered vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub plate_no: String,
    pub vehicle_type: VehicleType,
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Active,
    Closed,
}

/// One stay of one vehicle in one slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: TicketId,
    pub plate_no: String,
    /// Type the slot was allocated for; fares are computed from it
    pub vehicle_type: VehicleType,
    pub slot_id: SlotId,
    pub slot_number: String,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub status: TicketStatus,
}

impl Ticket {
    pub fn is_active(&self) -> bool {
        self.status == TicketStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Pending => f.write_str("PENDING"),
            PaymentStatus::Success => f.write_str("SUCCESS"),
        }
    }
}

/// Fare owed (or settled) for a ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub ticket_id: TicketId,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
    pub status: PaymentStatus,
}

/// Storage of vehicles, tickets and payments
pub trait TicketLedger: Send + Sync {
    /// Find a vehicle by plate, creating or refreshing its record
    fn upsert_vehicle(
        &self,
        plate_no: &str,
        vehicle_type: VehicleType,
        owner_name: Option<&str>,
    ) -> Result<Vehicle>;

    fn find_vehicle(&self, plate_no: &str) -> Result<Option<Vehicle>>;

    /// The ACTIVE ticket for a plate, if any
    fn find_active_ticket(&self, plate_no: &str) -> Result<Option<Ticket>>;

    /// Open an ACTIVE ticket; fails with `Conflict` if the plate already has one
    fn open_ticket(
        &self,
        vehicle: &Vehicle,
        vehicle_type: VehicleType,
        slot: &Slot,
        entry_time: DateTime<Utc>,
    ) -> Result<Ticket>;

    fn get_ticket(&self, id: TicketId) -> Result<Option<Ticket>>;

    /// ACTIVE → CLOSED
    fn close_ticket(&self, id: TicketId, exit_time: DateTime<Utc>) -> Result<Ticket>;

    /// Record (or replace) the PENDING payment of a ticket
    fn record_pending_payment(
        &self,
        ticket_id: TicketId,
        amount: u64,
        at: DateTime<Utc>,
    ) -> Result<Payment>;

    fn find_payment(&self, ticket_id: TicketId) -> Result<Option<Payment>>;

    /// PENDING → SUCCESS
    fn confirm_payment(&self, ticket_id: TicketId, at: DateTime<Utc>) -> Result<Payment>;

    /// Settle and close a ticket in one step
    ///
    /// The ticket must be ACTIVE with a PENDING payment no larger than
    /// `offered`. On success the payment is SUCCESS and the ticket CLOSED;
    /// on failure neither changes. Only one caller can win this for a
    /// given ticket.
    fn settle_exit(
        &self,
        ticket_id: TicketId,
        offered: u64,
        at: DateTime<Utc>,
    ) -> Result<(Ticket, Payment)>;

    fn active_tickets(&self) -> Result<Vec<Ticket>>;
}
