//! End-to-end entry/fare/exit flows over the bundled seed data

use chrono::Duration;
use parkgate::config::Settings;
use parkgate::error::{Error, Result};
use parkgate::ledger::{PaymentStatus, TicketId};
use parkgate::model::{SlotStatus, SlotUpdate};
use parkgate::workflow::{EntryRequest, ExitRequest};
use parkgate::{Gate, ParkingService, VehicleType};
use std::path::Path;

fn service() -> Result<ParkingService> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut settings = Settings::default();
    settings.data.slots_path = root.join("data/slots.json");
    settings.data.distances_path = root.join("data/parking_distances.json");
    ParkingService::from_settings(&settings)
}

fn entry(plate: &str, vehicle_type: VehicleType, gate: Gate) -> EntryRequest {
    EntryRequest {
        plate_no: plate.to_string(),
        vehicle_type,
        entry_gate: gate,
        owner_name: None,
    }
}

fn exit(ticket_id: TicketId, amount: u64) -> ExitRequest {
    ExitRequest {
        ticket_id,
        amount,
        payment_method: None,
    }
}

fn free(service: &ParkingService, vehicle_type: VehicleType) -> usize {
    service
        .availability()
        .unwrap()
        .into_iter()
        .find(|a| a.vehicle_type == vehicle_type)
        .map(|a| a.free_slots)
        .unwrap()
}

#[test]
fn test_seed_data_loads() -> Result<()> {
    let service = service()?;
    assert_eq!(service.list_slots()?.len(), 26);
    assert_eq!(free(&service, VehicleType::Car), 10);
    assert_eq!(free(&service, VehicleType::Bike), 8);
    assert_eq!(free(&service, VehicleType::Truck), 8);
    assert!(service.check_consistency()?.is_empty());
    Ok(())
}

#[test]
fn test_full_visit() -> Result<()> {
    let service = service()?;

    let ticket = service.enter(entry("mh12ab1234", VehicleType::Car, Gate::Gate1))?;
    assert_eq!(ticket.plate_no, "MH12AB1234");
    assert_eq!(ticket.slot_number, "F1-01");
    assert_eq!(ticket.distance, 10);
    assert_eq!(free(&service, VehicleType::Car), 9);

    let fare = service.quote_fare_at(ticket.ticket_id, ticket.entry_time + Duration::minutes(90))?;
    assert_eq!(fare.duration_minutes, 90);
    assert_eq!(fare.amount, 40);

    let err = service
        .exit_at(exit(ticket.ticket_id, 30), ticket.entry_time + Duration::minutes(95))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::InsufficientPayment {
            required: 40,
            offered: 30
        }
    ));
    assert_eq!(free(&service, VehicleType::Car), 9);

    let receipt = service.exit_at(
        exit(ticket.ticket_id, 50),
        ticket.entry_time + Duration::minutes(95),
    )?;
    assert_eq!(receipt.payment_status, PaymentStatus::Success);
    assert_eq!(receipt.amount_due, 40);
    assert_eq!(receipt.remaining_change, 10);
    assert!(receipt.slot_freed);
    assert_eq!(free(&service, VehicleType::Car), 10);
    assert!(service.ledger().find_active_ticket("MH12AB1234")?.is_none());

    assert!(matches!(
        service.exit(exit(ticket.ticket_id, 50)),
        Err(Error::InvalidTransition(_))
    ));
    assert!(service.check_consistency()?.is_empty());
    Ok(())
}

#[test]
fn test_duplicate_plate_rejected() -> Result<()> {
    let service = service()?;
    service.enter(entry("KA01", VehicleType::Bike, Gate::Gate2))?;

    let err = service
        .enter(entry("ka01", VehicleType::Bike, Gate::Gate3))
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));
    assert_eq!(free(&service, VehicleType::Bike), 7);
    Ok(())
}

#[test]
fn test_exit_requires_quote() -> Result<()> {
    let service = service()?;
    let ticket = service.enter(entry("TN09", VehicleType::Truck, Gate::Gate3))?;

    assert!(matches!(
        service.exit(exit(ticket.ticket_id, 1_000)),
        Err(Error::InvalidTransition(_))
    ));
    assert!(matches!(
        service.quote_fare(TicketId(9_999)),
        Err(Error::NotFound(_))
    ));
    Ok(())
}

#[test]
fn test_capacity_exhaustion_issues_no_ticket() -> Result<()> {
    let service = service()?;
    for i in 0..8 {
        service.enter(entry(&format!("TRUCK{}", i), VehicleType::Truck, Gate::ALL[i % 3]))?;
    }

    let err = service
        .enter(entry("TRUCK8", VehicleType::Truck, Gate::Gate1))
        .unwrap_err();
    assert!(err.is_capacity_exhausted());
    assert!(service.ledger().find_active_ticket("TRUCK8")?.is_none());
    assert_eq!(free(&service, VehicleType::Truck), 0);
    assert_eq!(free(&service, VehicleType::Car), 10);
    Ok(())
}

#[test]
fn test_exit_after_admin_freed_slot() -> Result<()> {
    let service = service()?;
    let ticket = service.enter(entry("DL3C", VehicleType::Car, Gate::Gate2))?;
    let slot = service
        .list_slots()?
        .into_iter()
        .find(|s| s.slot_number == ticket.slot_number)
        .unwrap();
    assert_eq!(slot.status, SlotStatus::Occupied);

    service.update_slot(
        slot.id,
        SlotUpdate {
            status: Some(SlotStatus::Free),
            ..SlotUpdate::default()
        },
    )?;

    let fare = service.quote_fare(ticket.ticket_id)?;
    let receipt = service.exit(exit(ticket.ticket_id, fare.amount))?;
    assert!(!receipt.slot_freed);
    assert_eq!(receipt.remaining_change, 0);
    assert_eq!(free(&service, VehicleType::Car), 10);
    assert!(service.check_consistency()?.is_empty());
    Ok(())
}
