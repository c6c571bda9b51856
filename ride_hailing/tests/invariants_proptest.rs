/// Property-based tests for the engine invariants using proptest
///
/// Fares are deterministic and non-negative, wallet balances always equal the
/// signed sum of their entries, booking history only ever grows, and a vehicle
/// serves at most one accepted or started booking whatever mix of transitions,
/// availability overrides and payments hits it.
use chrono::Utc;
use proptest::prelude::*;
use ride_hailing::booking::{
    Actor, BookingManager, BookingNumber, BookingStatus, Location, NewBooking, TransitionPayload,
    TripDetails,
};
use ride_hailing::db::{MemoryStore, Store};
use ride_hailing::fare::{
    compute_fare, DistanceTier, PricingProfile, TierRates, TripType, VehicleCategory,
};
use ride_hailing::gateway::{InMemoryGateway, LogNotifier};
use ride_hailing::ledger::{Ledger, LedgerError};
use ride_hailing::vehicle::{
    NewVehicle, ReviewDecision, Vehicle, VehicleStatus, VehicleTracker,
};
use ride_hailing::EngineConfig;
use std::sync::Arc;
use tokio::runtime::Runtime;

const DRIVER: i64 = 5;
const RIDER: i64 = 50;
const BOOKINGS: usize = 3;

fn runtime() -> Runtime {
    Runtime::new().unwrap()
}

fn full_tiers(base: f64) -> TierRates {
    DistanceTier::ALL
        .into_iter()
        .enumerate()
        .fold(TierRates::default(), |rates, (i, tier)| {
            rates.with(tier, base - i as f64)
        })
}

fn profile_strategy() -> impl Strategy<Value = PricingProfile> {
    prop_oneof![
        (1.0f64..60.0, 1.0f64..60.0).prop_map(|(one_way, ret)| PricingProfile::auto(one_way, ret)),
        (10.0f64..40.0, 10.0f64..40.0)
            .prop_map(|(one_way, ret)| PricingProfile::tiered(full_tiers(one_way), full_tiers(ret))),
    ]
}

fn trip_type_strategy() -> impl Strategy<Value = TripType> {
    prop_oneof![Just(TripType::OneWay), Just(TripType::Return)]
}

fn target_strategy() -> impl Strategy<Value = BookingStatus> {
    prop_oneof![
        Just(BookingStatus::Pending),
        Just(BookingStatus::Accepted),
        Just(BookingStatus::Started),
        Just(BookingStatus::Completed),
        Just(BookingStatus::Cancelled),
    ]
}

fn actor_strategy() -> impl Strategy<Value = Actor> {
    prop_oneof![
        Just(Actor::rider(RIDER)),
        Just(Actor::driver(DRIVER)),
        Just(Actor::admin(1)),
    ]
}

/// One step against a vehicle shared by `BOOKINGS` bookings
#[derive(Debug, Clone)]
enum Step {
    Transition(usize, BookingStatus, Actor),
    Override(VehicleStatus, Option<usize>, Actor),
    Pay(usize),
}

fn override_status_strategy() -> impl Strategy<Value = VehicleStatus> {
    prop_oneof![
        Just(VehicleStatus::Available),
        Just(VehicleStatus::Offline),
        Just(VehicleStatus::Maintenance),
        Just(VehicleStatus::InTrip),
    ]
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0..BOOKINGS, target_strategy(), actor_strategy())
            .prop_map(|(i, target, actor)| Step::Transition(i, target, actor)),
        2 => (
            override_status_strategy(),
            prop::option::of(0..BOOKINGS),
            prop_oneof![Just(Actor::driver(DRIVER)), Just(Actor::admin(1))],
        )
            .prop_map(|(status, booking, actor)| Step::Override(status, booking, actor)),
        1 => (0..BOOKINGS).prop_map(Step::Pay),
    ]
}

proptest! {
    #[test]
    fn test_fare_is_deterministic_and_non_negative(
        profile in profile_strategy(),
        distance in 0.0f64..300.0,
        trip_type in trip_type_strategy(),
    ) {
        let first = compute_fare(&profile, distance, trip_type).unwrap();
        let second = compute_fare(&profile, distance, trip_type).unwrap();

        prop_assert_eq!(first, second);
        prop_assert!(first >= 0);
    }

    #[test]
    fn test_negative_distance_never_priced(
        profile in profile_strategy(),
        distance in -1_000.0f64..-0.001,
        trip_type in trip_type_strategy(),
    ) {
        prop_assert!(compute_fare(&profile, distance, trip_type).is_err());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_balance_matches_entries(
        ops in prop::collection::vec((any::<bool>(), 1i64..500), 1..40)
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            let ledger = Ledger::new(store, 100);

            for (is_credit, amount) in ops {
                let before = ledger.wallet(DRIVER).await.unwrap().balance;
                let result = if is_credit {
                    ledger.credit(DRIVER, amount, "top up").await
                } else {
                    ledger.debit(DRIVER, amount, "adjustment").await
                };

                match result {
                    Ok(entry) => prop_assert!(entry.balance_after >= 0),
                    Err(LedgerError::InsufficientBalance { available, required, .. }) => {
                        prop_assert!(!is_credit);
                        prop_assert_eq!(available, before);
                        prop_assert_eq!(required, amount);
                        prop_assert_eq!(ledger.wallet(DRIVER).await.unwrap().balance, before);
                    }
                    Err(other) => prop_assert!(false, "unexpected error: {other}"),
                }

                let balance = ledger.wallet(DRIVER).await.unwrap().balance;
                let entries = ledger.entries(DRIVER, 500).await.unwrap();
                let sum: i64 = entries.iter().map(|e| e.signed_amount()).sum();
                prop_assert!(balance >= 0);
                prop_assert_eq!(balance, sum);
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn test_history_is_append_only(
        steps in prop::collection::vec((target_strategy(), actor_strategy()), 1..12)
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            let tracker = VehicleTracker::new(store.clone());
            let bookings = BookingManager::new(
                store,
                Arc::new(InMemoryGateway::new()),
                Arc::new(LogNotifier),
                EngineConfig::default(),
            );

            let vehicle = tracker
                .register(
                    &Actor::driver(DRIVER),
                    NewVehicle {
                        driver_id: DRIVER,
                        registration_number: "MH12PQ7788".to_string(),
                        category: VehicleCategory::Auto,
                        pricing: PricingProfile::auto(12.0, 14.0),
                    },
                )
                .await
                .unwrap();
            tracker.review(vehicle.id, ReviewDecision::Approve).await.unwrap();

            let location = Location {
                latitude: 18.52,
                longitude: 73.85,
                address: "Shivajinagar".to_string(),
            };
            let created = bookings
                .create_booking(
                    &Actor::rider(RIDER),
                    NewBooking {
                        vehicle_id: vehicle.id,
                        trip: TripDetails {
                            pickup: location.clone(),
                            destination: location,
                            scheduled_at: Utc::now(),
                            distance_km: 8.0,
                            trip_type: TripType::OneWay,
                        },
                    },
                )
                .await
                .unwrap();

            let mut previous = created.history.clone();
            for (target, actor) in steps {
                let result = bookings
                    .transition(&created.number, target, &actor, TransitionPayload::default())
                    .await;
                let booking = bookings
                    .get_booking(&Actor::admin(1), &created.number)
                    .await
                    .unwrap();

                let grown = usize::from(result.is_ok());
                prop_assert_eq!(booking.history.len(), previous.len() + grown);
                prop_assert_eq!(&booking.history[..previous.len()], &previous[..]);
                prop_assert!(booking.history_is_consistent());

                let vehicle = tracker.get(vehicle.id).await.unwrap();
                match booking.status {
                    BookingStatus::Accepted => {
                        prop_assert_eq!(vehicle.status, VehicleStatus::Booked);
                        prop_assert_eq!(vehicle.current_booking.as_ref(), Some(&booking.number));
                    }
                    BookingStatus::Started => {
                        prop_assert_eq!(vehicle.status, VehicleStatus::InTrip);
                        prop_assert_eq!(vehicle.current_booking.as_ref(), Some(&booking.number));
                    }
                    _ => {
                        prop_assert_eq!(vehicle.status, VehicleStatus::Available);
                        prop_assert!(vehicle.current_booking.is_none());
                    }
                }

                previous = booking.history;
            }
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn test_one_active_booking_per_vehicle(
        steps in prop::collection::vec(step_strategy(), 1..24)
    ) {
        let rt = runtime();
        rt.block_on(async {
            let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
            let gateway = Arc::new(InMemoryGateway::new());
            let tracker = VehicleTracker::new(store.clone());
            let bookings = BookingManager::new(
                store,
                gateway.clone(),
                Arc::new(LogNotifier),
                EngineConfig::default(),
            );

            let vehicle = tracker
                .register(
                    &Actor::driver(DRIVER),
                    NewVehicle {
                        driver_id: DRIVER,
                        registration_number: "GJ01ZX3030".to_string(),
                        category: VehicleCategory::Auto,
                        pricing: PricingProfile::auto(12.0, 14.0),
                    },
                )
                .await
                .unwrap();
            let vehicle = tracker.review(vehicle.id, ReviewDecision::Approve).await.unwrap();

            let location = Location {
                latitude: 23.02,
                longitude: 72.57,
                address: "Navrangpura".to_string(),
            };
            let mut numbers: Vec<BookingNumber> = Vec::with_capacity(BOOKINGS);
            for _ in 0..BOOKINGS {
                let created = bookings
                    .create_booking(
                        &Actor::rider(RIDER),
                        NewBooking {
                            vehicle_id: vehicle.id,
                            trip: TripDetails {
                                pickup: location.clone(),
                                destination: location.clone(),
                                scheduled_at: Utc::now(),
                                distance_km: 8.0,
                                trip_type: TripType::OneWay,
                            },
                        },
                    )
                    .await
                    .unwrap();
                numbers.push(created.number);
            }

            for step in steps {
                match step {
                    Step::Transition(i, target, actor) => {
                        let _ = bookings
                            .transition(&numbers[i], target, &actor, TransitionPayload::default())
                            .await;
                    }
                    Step::Override(status, booking, actor) => {
                        let booking = booking.map(|i| &numbers[i]);
                        let _ = tracker.set_status(&actor, vehicle.id, status, booking).await;
                    }
                    Step::Pay(i) => {
                        let reference = format!("pay_{i}");
                        gateway.capture(&reference);
                        let _ = bookings
                            .record_payment(&Actor::rider(RIDER), &numbers[i], &reference)
                            .await;
                    }
                }

                let vehicle: Vehicle = tracker.get(vehicle.id).await.unwrap();
                let mut active = Vec::new();
                for number in &numbers {
                    let booking = bookings.get_booking(&Actor::admin(1), number).await.unwrap();
                    prop_assert!(booking.history_is_consistent());
                    if let Some(cancellation) = &booking.cancellation {
                        let owed = if booking.payment.is_captured() { booking.fare } else { 0 };
                        prop_assert_eq!(cancellation.refund_amount, owed);
                    }
                    if booking.status.holds_vehicle() {
                        active.push(booking);
                    }
                }

                prop_assert!(active.len() <= 1, "active bookings: {:?}", active.len());
                match active.first() {
                    Some(booking) => {
                        prop_assert_eq!(vehicle.current_booking.as_ref(), Some(&booking.number));
                        if booking.status == BookingStatus::Started {
                            prop_assert_eq!(vehicle.status, VehicleStatus::InTrip);
                        } else {
                            prop_assert!(vehicle.status.is_engaged());
                        }
                    }
                    None => {
                        prop_assert!(!vehicle.status.is_engaged());
                        prop_assert!(vehicle.current_booking.is_none());
                    }
                }
            }
            Ok::<(), TestCaseError>(())
        })?;
    }
}
