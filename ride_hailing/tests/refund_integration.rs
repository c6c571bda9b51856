//! Refund progression for cancelled bookings.

use chrono::Utc;
use ride_hailing::booking::{
    Actor, BookingManager, BookingNumber, BookingStatus, Location, NewBooking, TransitionPayload,
    TripDetails,
};
use ride_hailing::db::{MemoryStore, Store};
use ride_hailing::fare::{PricingProfile, TripType, VehicleCategory};
use ride_hailing::gateway::{InMemoryGateway, LogNotifier};
use ride_hailing::refund::{RefundError, RefundManager, RefundMethod, RefundStatus};
use ride_hailing::vehicle::{NewVehicle, ReviewDecision, VehicleTracker};
use ride_hailing::EngineConfig;
use std::sync::Arc;

const DRIVER: i64 = 3;
const RIDER: i64 = 30;

struct Harness {
    gateway: Arc<InMemoryGateway>,
    bookings: BookingManager,
    refunds: RefundManager,
    number: BookingNumber,
}

/// A pending 150 booking; paid with `pay_ref` when given
async fn booking(paid_with: Option<&str>) -> Harness {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let gateway = Arc::new(InMemoryGateway::new());
    let tracker = VehicleTracker::new(store.clone());
    let bookings = BookingManager::new(
        store.clone(),
        gateway.clone(),
        Arc::new(LogNotifier),
        EngineConfig::default(),
    );
    let refunds = RefundManager::new(store, gateway.clone());

    let vehicle = tracker
        .register(
            &Actor::driver(DRIVER),
            NewVehicle {
                driver_id: DRIVER,
                registration_number: "TN09RF1234".to_string(),
                category: VehicleCategory::Auto,
                pricing: PricingProfile::auto(15.0, 18.0),
            },
        )
        .await
        .unwrap();
    tracker
        .review(vehicle.id, ReviewDecision::Approve)
        .await
        .unwrap();

    let number = bookings
        .create_booking(
            &Actor::rider(RIDER),
            NewBooking {
                vehicle_id: vehicle.id,
                trip: TripDetails {
                    pickup: Location {
                        latitude: 13.08,
                        longitude: 80.27,
                        address: "Central".to_string(),
                    },
                    destination: Location {
                        latitude: 13.00,
                        longitude: 80.25,
                        address: "Adyar".to_string(),
                    },
                    scheduled_at: Utc::now(),
                    distance_km: 10.0,
                    trip_type: TripType::OneWay,
                },
            },
        )
        .await
        .unwrap()
        .number;

    if let Some(reference) = paid_with {
        gateway.capture(reference);
        bookings
            .record_payment(&Actor::rider(RIDER), &number, reference)
            .await
            .unwrap();
    }

    Harness {
        gateway,
        bookings,
        refunds,
        number,
    }
}

async fn cancel(h: &Harness, actor: &Actor, payload: TransitionPayload) {
    h.bookings
        .transition(&h.number, BookingStatus::Cancelled, actor, payload)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unpaid_cancellation_has_nothing_to_refund() {
    let h = booking(None).await;
    cancel(&h, &Actor::rider(RIDER), TransitionPayload::default()).await;

    let err = h
        .refunds
        .initiate_refund(&h.number, RefundMethod::Manual, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RefundError::AlreadyRefunded(_)));
}

#[tokio::test]
async fn test_gateway_refund_flow() {
    let h = booking(Some("pay_100")).await;
    cancel(&h, &Actor::rider(RIDER), TransitionPayload::default()).await;

    let booking = h
        .refunds
        .initiate_refund(&h.number, RefundMethod::Gateway, None)
        .await
        .unwrap();
    let cancellation = booking.cancellation.as_ref().unwrap();
    assert_eq!(cancellation.refund_status, RefundStatus::Initiated);
    assert_eq!(cancellation.refund_method, Some(RefundMethod::Gateway));
    assert!(cancellation.refund_reference.is_some());
    assert!(cancellation.refund_initiated_at.is_some());

    let sent = h.gateway.refunds();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].amount, 150);
    assert_eq!(sent[0].payment_reference, "pay_100");
    assert_eq!(sent[0].idempotency_key, format!("refund-{}", h.number));

    let booking = h.refunds.complete_refund(&h.number).await.unwrap();
    let cancellation = booking.cancellation.as_ref().unwrap();
    assert_eq!(cancellation.refund_status, RefundStatus::Completed);
    assert!(cancellation.refund_completed_at.is_some());

    // Completed refunds stay completed
    let err = h.refunds.complete_refund(&h.number).await.unwrap_err();
    assert!(matches!(err, RefundError::AlreadyRefunded(_)));
    let err = h
        .refunds
        .initiate_refund(&h.number, RefundMethod::Gateway, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RefundError::AlreadyRefunded(_)));
    assert_eq!(h.gateway.refunds().len(), 1);
}

#[tokio::test]
async fn test_manual_refund_records_reference() {
    let h = booking(Some("pay_200")).await;
    cancel(&h, &Actor::rider(RIDER), TransitionPayload::default()).await;

    let booking = h
        .refunds
        .initiate_refund(&h.number, RefundMethod::Manual, Some("NEFT-7781".to_string()))
        .await
        .unwrap();
    let cancellation = booking.cancellation.as_ref().unwrap();
    assert_eq!(cancellation.refund_method, Some(RefundMethod::Manual));
    assert_eq!(cancellation.refund_reference.as_deref(), Some("NEFT-7781"));
    assert!(h.gateway.refunds().is_empty());
}

#[tokio::test]
async fn test_complete_before_initiate_is_rejected() {
    let h = booking(Some("pay_300")).await;
    cancel(&h, &Actor::rider(RIDER), TransitionPayload::default()).await;

    let err = h.refunds.complete_refund(&h.number).await.unwrap_err();
    assert!(matches!(
        err,
        RefundError::InvalidTransition {
            from: RefundStatus::Pending,
            to: RefundStatus::Completed
        }
    ));
}

#[tokio::test]
async fn test_initiate_twice_is_rejected() {
    let h = booking(Some("pay_400")).await;
    cancel(&h, &Actor::rider(RIDER), TransitionPayload::default()).await;

    h.refunds
        .initiate_refund(&h.number, RefundMethod::Gateway, None)
        .await
        .unwrap();
    let err = h
        .refunds
        .initiate_refund(&h.number, RefundMethod::Gateway, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RefundError::InvalidTransition {
            from: RefundStatus::Initiated,
            ..
        }
    ));
}

#[tokio::test]
async fn test_admin_deduction_reduces_refund() {
    let h = booking(Some("pay_500")).await;
    cancel(
        &h,
        &Actor::admin(1),
        TransitionPayload {
            refund_deduction: Some(40),
            ..TransitionPayload::default()
        },
    )
    .await;

    h.refunds
        .initiate_refund(&h.number, RefundMethod::Gateway, None)
        .await
        .unwrap();
    assert_eq!(h.gateway.refunds()[0].amount, 110);
}

#[tokio::test]
async fn test_active_booking_has_no_refund() {
    let h = booking(Some("pay_600")).await;

    let err = h
        .refunds
        .initiate_refund(&h.number, RefundMethod::Manual, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RefundError::NotCancelled {
            status: BookingStatus::Pending,
            ..
        }
    ));
}
