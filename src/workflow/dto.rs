//! Request and response types of the entry/exit workflow

use crate::ledger::{PaymentStatus, TicketId};
use crate::model::{Gate, VehicleType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRequest {
    pub plate_no: String,
    #[serde(alias = "type")]
    pub vehicle_type: VehicleType,
    pub entry_gate: Gate,
    #[serde(default)]
    pub owner_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub ticket_id: TicketId,
    pub plate_no: String,
    pub slot_number: String,
    pub floor_number: i32,
    pub entry_gate: Gate,
    /// Precomputed distance from the entry gate to the slot
    pub distance: u32,
    pub entry_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareResponse {
    pub ticket_id: TicketId,
    pub plate_no: String,
    pub duration_minutes: i64,
    pub amount: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitRequest {
    pub ticket_id: TicketId,
    /// Amount tendered
    pub amount: u64,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptResponse {
    pub ticket_id: TicketId,
    pub plate_no: String,
    pub slot_number: String,
    pub exit_time: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub amount_due: u64,
    pub paid_amount: u64,
    pub remaining_change: u64,
    /// False when the slot had already been freed administratively
    pub slot_freed: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    pub vehicle_type: VehicleType,
    pub free_slots: usize,
}
