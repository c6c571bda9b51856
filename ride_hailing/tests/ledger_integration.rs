//! Driver wallet tests: trip earnings, withdrawals and cancellation penalties.

use chrono::Utc;
use ride_hailing::booking::{
    Actor, BookingError, BookingManager, BookingNumber, BookingStatus, Location, NewBooking,
    TransitionPayload, TripDetails,
};
use ride_hailing::db::{MemoryStore, Store};
use ride_hailing::fare::{PricingProfile, TripType, VehicleCategory};
use ride_hailing::gateway::{InMemoryGateway, LogNotifier};
use ride_hailing::ledger::{EntryKind, Ledger, LedgerError, WithdrawalStatus};
use ride_hailing::vehicle::{NewVehicle, ReviewDecision, Vehicle, VehicleStatus, VehicleTracker};
use ride_hailing::EngineConfig;
use std::sync::Arc;

const DRIVER: i64 = 8;
const RIDER: i64 = 80;

struct Harness {
    tracker: VehicleTracker,
    bookings: BookingManager,
    ledger: Ledger,
}

fn harness(config: EngineConfig) -> Harness {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    Harness {
        tracker: VehicleTracker::new(store.clone()),
        bookings: BookingManager::new(
            store.clone(),
            Arc::new(InMemoryGateway::new()),
            Arc::new(LogNotifier),
            config.clone(),
        ),
        ledger: Ledger::new(store, config.min_withdrawal_amount),
    }
}

async fn approved_auto(h: &Harness) -> Vehicle {
    let vehicle = h
        .tracker
        .register(
            &Actor::driver(DRIVER),
            NewVehicle {
                driver_id: DRIVER,
                registration_number: "DL3CAB9090".to_string(),
                category: VehicleCategory::Auto,
                pricing: PricingProfile::auto(15.0, 18.0),
            },
        )
        .await
        .unwrap();
    h.tracker
        .review(vehicle.id, ReviewDecision::Approve)
        .await
        .unwrap()
}

async fn accepted_booking(h: &Harness, vehicle: &Vehicle) -> BookingNumber {
    let booking = h
        .bookings
        .create_booking(
            &Actor::rider(RIDER),
            NewBooking {
                vehicle_id: vehicle.id,
                trip: TripDetails {
                    pickup: Location {
                        latitude: 28.61,
                        longitude: 77.20,
                        address: "Connaught Place".to_string(),
                    },
                    destination: Location {
                        latitude: 28.55,
                        longitude: 77.10,
                        address: "IGI Airport".to_string(),
                    },
                    scheduled_at: Utc::now(),
                    distance_km: 10.0,
                    trip_type: TripType::OneWay,
                },
            },
        )
        .await
        .unwrap();
    h.bookings
        .transition(
            &booking.number,
            BookingStatus::Accepted,
            &Actor::driver(DRIVER),
            TransitionPayload::default(),
        )
        .await
        .unwrap();
    booking.number
}

async fn complete_trip(h: &Harness, vehicle: &Vehicle) {
    let number = accepted_booking(h, vehicle).await;
    for status in [BookingStatus::Started, BookingStatus::Completed] {
        h.bookings
            .transition(
                &number,
                status,
                &Actor::driver(DRIVER),
                TransitionPayload::default(),
            )
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_withdrawal_over_balance_appends_nothing() {
    let h = harness(EngineConfig::default());
    let vehicle = approved_auto(&h).await;
    complete_trip(&h, &vehicle).await;

    let before = h.ledger.entries(DRIVER, 100).await.unwrap();
    assert_eq!(h.ledger.wallet(DRIVER).await.unwrap().balance, 150);

    let err = h.ledger.request_withdrawal(DRIVER, 200).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientBalance {
            available: 150,
            required: 200,
            ..
        }
    ));

    assert_eq!(h.ledger.entries(DRIVER, 100).await.unwrap(), before);
    assert!(h.ledger.withdrawals(DRIVER).await.unwrap().is_empty());
    assert_eq!(h.ledger.wallet(DRIVER).await.unwrap().balance, 150);
}

#[tokio::test]
async fn test_withdrawal_is_escrowed() {
    let h = harness(EngineConfig::default());
    let vehicle = approved_auto(&h).await;
    complete_trip(&h, &vehicle).await;
    complete_trip(&h, &vehicle).await;

    let withdrawal = h.ledger.request_withdrawal(DRIVER, 120).await.unwrap();
    assert_eq!(withdrawal.status, WithdrawalStatus::Pending);

    let entries = h.ledger.entries(DRIVER, 100).await.unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].id, withdrawal.entry_id);
    assert_eq!(entries[0].kind, EntryKind::Withdrawal);
    assert_eq!(entries[0].balance_after, 180);

    let sum: i64 = entries.iter().map(|e| e.signed_amount()).sum();
    assert_eq!(h.ledger.wallet(DRIVER).await.unwrap().balance, sum);
}

#[tokio::test]
async fn test_driver_cancellation_penalty() {
    let h = harness(EngineConfig {
        driver_cancellation_penalty: 50,
        ..EngineConfig::default()
    });
    let vehicle = approved_auto(&h).await;
    complete_trip(&h, &vehicle).await;

    let number = accepted_booking(&h, &vehicle).await;
    let booking = h
        .bookings
        .transition(
            &number,
            BookingStatus::Cancelled,
            &Actor::driver(DRIVER),
            TransitionPayload::with_reason("vehicle breakdown"),
        )
        .await
        .unwrap();

    assert_eq!(booking.cancellation.as_ref().unwrap().driver_penalty, 50);
    assert_eq!(h.ledger.wallet(DRIVER).await.unwrap().balance, 100);

    let latest = &h.ledger.entries(DRIVER, 1).await.unwrap()[0];
    assert_eq!(latest.kind, EntryKind::Penalty);
    assert_eq!(latest.booking, Some(number));
}

#[tokio::test]
async fn test_unaffordable_penalty_aborts_cancellation() {
    let h = harness(EngineConfig {
        driver_cancellation_penalty: 50,
        ..EngineConfig::default()
    });
    let vehicle = approved_auto(&h).await;
    let number = accepted_booking(&h, &vehicle).await;

    let err = h
        .bookings
        .transition(
            &number,
            BookingStatus::Cancelled,
            &Actor::driver(DRIVER),
            TransitionPayload::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::InsufficientBalance {
            status: BookingStatus::Accepted,
            ..
        }
    ));

    // Nothing moved: booking, vehicle and wallet are as before
    let booking = h
        .bookings
        .get_booking(&Actor::driver(DRIVER), &number)
        .await
        .unwrap();
    assert_eq!(booking.status, BookingStatus::Accepted);
    assert!(booking.cancellation.is_none());
    let vehicle = h.tracker.get(vehicle.id).await.unwrap();
    assert_eq!(vehicle.status, VehicleStatus::Booked);
    assert!(h.ledger.entries(DRIVER, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rider_cancellation_does_not_penalize_driver() {
    let h = harness(EngineConfig {
        driver_cancellation_penalty: 50,
        ..EngineConfig::default()
    });
    let vehicle = approved_auto(&h).await;
    let number = accepted_booking(&h, &vehicle).await;

    let booking = h
        .bookings
        .transition(
            &number,
            BookingStatus::Cancelled,
            &Actor::rider(RIDER),
            TransitionPayload::default(),
        )
        .await
        .unwrap();
    assert_eq!(booking.cancellation.as_ref().unwrap().driver_penalty, 0);
    assert!(h.ledger.entries(DRIVER, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_penalty_guarded_by_balance() {
    let h = harness(EngineConfig::default());
    let vehicle = approved_auto(&h).await;
    complete_trip(&h, &vehicle).await;

    let err = h
        .ledger
        .apply_penalty(DRIVER, 151, "No-show")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::InsufficientBalance { .. }));

    let entry = h.ledger.apply_penalty(DRIVER, 150, "No-show").await.unwrap();
    assert_eq!(entry.balance_after, 0);
}
