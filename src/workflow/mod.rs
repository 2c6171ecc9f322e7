//! Parking workflows
//!
//! [`ParkingService`] wires the allocator to the ticket ledger and the fare
//! policy:
//!
//! - entry: duplicate-plate check, allocation, ticket
//! - fare: price the stay and record a pending payment
//! - exit: settle the payment, close the ticket, release the slot
//!
//! It also exposes administrative slot management, which rebuilds the
//! index after each change.

pub mod admin;
pub mod dto;
pub mod service;

pub use dto::{
    Availability, EntryRequest, ExitRequest, FareResponse, ReceiptResponse, TicketResponse,
};
pub use service::ParkingService;
