//! Booking manager: creation, transitions and payment recording.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{
    errors::{BookingError, BookingResult},
    models::{
        Actor, ActorRole, Booking, BookingNumber, BookingStatus, NewBooking, Payment,
        PaymentStatus, TransitionPayload, TripExecution,
    },
    state_machine::check_transition,
};
use crate::config::EngineConfig;
use crate::db::{Store, StoreError, TransitionCommit, VehicleChange};
use crate::fare::{FareError, Money, compute_fare};
use crate::gateway::{BookingEvent, CaptureStatus, GatewayError, Notifier, PaymentGateway};
use crate::ledger::{EntryKind, LedgerPosting};
use crate::refund::plan_cancellation;
use crate::vehicle::{TripStats, Vehicle, VehicleId};

/// Commit attempts before a transition gives up on a booking that keeps changing
const MAX_COMMIT_ATTEMPTS: usize = 3;

/// Booking manager
#[derive(Clone)]
pub struct BookingManager {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
    config: EngineConfig,
}

impl BookingManager {
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            notifier,
            config,
        }
    }

    /// Create a pending booking with its fare snapshot
    ///
    /// # Errors
    ///
    /// * `BookingError::Forbidden` - Only riders request trips
    /// * `BookingError::NotFound` - No such vehicle
    /// * `BookingError::VehicleNotBookable` - Vehicle not approved, verified and active
    /// * `BookingError::Fare` - No rate for the trip, or a bad distance
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: NewBooking,
    ) -> BookingResult<Booking> {
        if actor.role != ActorRole::Rider {
            return Err(BookingError::Forbidden(actor.role));
        }

        let vehicle = self.vehicle(request.vehicle_id).await?;
        if !vehicle.is_bookable() {
            return Err(BookingError::VehicleNotBookable(vehicle.id));
        }

        let fare = compute_fare(
            &vehicle.pricing,
            request.trip.distance_km,
            request.trip.trip_type,
        )?;

        let booking = Booking::pending(
            BookingNumber::generate(),
            actor.id,
            vehicle.id,
            request.trip,
            fare,
            Utc::now(),
        );
        self.store.insert_booking(&booking).await?;

        log::info!(
            "Booking {} created by rider {} on vehicle {} (fare {})",
            booking.number,
            booking.rider_id,
            booking.vehicle_id,
            booking.fare
        );
        self.notify(&booking).await;
        Ok(booking)
    }

    /// Booking as visible to `actor`
    pub async fn get_booking(&self, actor: &Actor, number: &BookingNumber) -> BookingResult<Booking> {
        let (booking, _) = self.load_owned(actor, number).await?;
        Ok(booking)
    }

    /// Audit listing for a vehicle, newest first: owning driver or admin
    pub async fn bookings_for_vehicle(
        &self,
        actor: &Actor,
        vehicle_id: VehicleId,
    ) -> BookingResult<Vec<Booking>> {
        let vehicle = self.vehicle(vehicle_id).await?;
        if !(actor.is_admin() || (actor.role == ActorRole::Driver && vehicle.driver_id == actor.id)) {
            return Err(BookingError::NotFound(format!("vehicle {vehicle_id}")));
        }
        Ok(self.store.bookings_for_vehicle(vehicle_id).await?)
    }

    /// Move a booking to `target`.
    ///
    /// The new status, its history entry, the vehicle reservation/release and any
    /// ledger postings are committed together or not at all. A payment recorded
    /// between planning and commit makes the manager re-read and re-plan, so a
    /// cancellation always refunds against the payment actually stored.
    ///
    /// # Errors
    ///
    /// * `BookingError::NotFound` - Missing, or not the actor's booking
    /// * `BookingError::InvalidTransition` - Not allowed from the current status for this role
    /// * `BookingError::VehicleUnavailable` - Reservation lost; booking stays `pending`
    /// * `BookingError::Fare` - Completion fare could not be recomputed
    /// * `BookingError::InsufficientBalance` - Driver cannot cover the cancellation penalty
    /// * `BookingError::Contended` - Booking kept changing underneath the commit
    pub async fn transition(
        &self,
        number: &BookingNumber,
        target: BookingStatus,
        actor: &Actor,
        payload: TransitionPayload,
    ) -> BookingResult<Booking> {
        let mut status = BookingStatus::Pending;
        for _ in 0..MAX_COMMIT_ATTEMPTS {
            let (booking, vehicle) = self.load_owned(actor, number).await?;
            check_transition(booking.status, target, actor.role)?;
            status = booking.status;

            let now = Utc::now();
            let payload = payload.clone();
            let commit = match target {
                BookingStatus::Accepted => {
                    Ok(self.plan_accept(&booking, &vehicle, actor, payload, now))
                }
                BookingStatus::Started => Ok(self.plan_start(&booking, actor, payload, now)),
                BookingStatus::Completed => {
                    self.plan_complete(&booking, &vehicle, actor, payload, now)
                }
                BookingStatus::Cancelled => {
                    Ok(self.plan_cancel(&booking, &vehicle, actor, payload, now))
                }
                BookingStatus::Pending => Err(BookingError::InvalidTransition {
                    from: booking.status,
                    to: target,
                    role: actor.role,
                }),
            }?;

            match self.store.commit_transition(&commit).await {
                Ok(()) => {
                    log::info!(
                        "Booking {} {} -> {} by {} {}",
                        booking.number,
                        booking.status,
                        target,
                        actor.role,
                        actor.id
                    );
                    self.notify(&commit.booking).await;
                    return Ok(commit.booking);
                }
                Err(StoreError::PaymentChanged(_)) => {
                    log::debug!(
                        "Booking {} payment changed before {} committed, replanning",
                        booking.number,
                        target
                    );
                }
                Err(err) => {
                    if matches!(err, StoreError::VehicleUnavailable(_)) {
                        log::info!(
                            "Booking {} lost vehicle {} to another booking",
                            booking.number,
                            booking.vehicle_id
                        );
                    } else {
                        log::warn!(
                            "Booking {} {} -> {} rejected: {}",
                            booking.number,
                            booking.status,
                            target,
                            err
                        );
                    }
                    return Err(BookingError::from_commit(
                        err,
                        booking.status,
                        target,
                        actor.role,
                    ));
                }
            }
        }

        log::warn!("Booking {number} -> {target} gave up after {MAX_COMMIT_ATTEMPTS} attempts");
        Err(BookingError::Contended { status })
    }

    /// Record a captured payment for a booking.
    ///
    /// Capture is confirmed with the gateway first, outside any transition.
    /// Recording the same reference twice is a no-op.
    ///
    /// # Errors
    ///
    /// * `BookingError::PaymentRejected` - Booking cancelled, paid under another
    ///   reference, or the payment is unknown or not captured
    /// * `BookingError::Gateway` - Gateway unreachable or returned an error
    pub async fn record_payment(
        &self,
        actor: &Actor,
        number: &BookingNumber,
        reference: &str,
    ) -> BookingResult<Booking> {
        let (booking, _) = self.load_owned(actor, number).await?;
        check_payable(&booking, reference)?;
        if booking.payment.is_captured() {
            return Ok(booking);
        }

        let status = match self.gateway.capture_status(reference).await {
            Ok(status) => status,
            Err(GatewayError::UnknownPayment(_)) => {
                return Err(BookingError::PaymentRejected(format!(
                    "payment {reference} is unknown to the gateway"
                )));
            }
            Err(err) => return Err(err.into()),
        };
        if status != CaptureStatus::Captured {
            return Err(BookingError::PaymentRejected(format!(
                "payment {reference} is {status}"
            )));
        }

        let payment = Payment {
            status: PaymentStatus::Paid,
            reference: Some(reference.to_string()),
            paid_at: Some(Utc::now()),
        };
        let marked = self.store.mark_paid(number, &payment).await?;

        let booking = self
            .store
            .get_booking(number)
            .await?
            .ok_or_else(|| BookingError::not_found(number))?;
        if !marked {
            // Raced with a cancel or another payment
            check_payable(&booking, reference)?;
        }

        log::info!("Booking {number} paid with {reference}");
        Ok(booking)
    }

    fn plan_accept(
        &self,
        booking: &Booking,
        vehicle: &Vehicle,
        actor: &Actor,
        payload: TransitionPayload,
        now: DateTime<Utc>,
    ) -> TransitionCommit {
        let mut next = booking.clone();
        next.driver_id = Some(vehicle.driver_id);
        next.record(
            BookingStatus::Accepted,
            actor,
            payload.reason,
            payload.notes,
            now,
        );

        TransitionCommit {
            booking: next,
            expected_status: booking.status,
            expected_payment: booking.payment.status,
            vehicle: Some(VehicleChange::Reserve {
                vehicle_id: booking.vehicle_id,
                booking: booking.number.clone(),
            }),
            postings: Vec::new(),
        }
    }

    fn plan_start(
        &self,
        booking: &Booking,
        actor: &Actor,
        payload: TransitionPayload,
        now: DateTime<Utc>,
    ) -> TransitionCommit {
        let mut next = booking.clone();
        next.execution = Some(TripExecution {
            started_at: now,
            ended_at: None,
            actual_distance_km: None,
            actual_duration_min: None,
            final_fare: None,
        });
        next.record(
            BookingStatus::Started,
            actor,
            payload.reason,
            payload.notes,
            now,
        );

        TransitionCommit {
            booking: next,
            expected_status: booking.status,
            expected_payment: booking.payment.status,
            vehicle: Some(VehicleChange::StartTrip {
                vehicle_id: booking.vehicle_id,
                booking: booking.number.clone(),
            }),
            postings: Vec::new(),
        }
    }

    fn plan_complete(
        &self,
        booking: &Booking,
        vehicle: &Vehicle,
        actor: &Actor,
        payload: TransitionPayload,
        now: DateTime<Utc>,
    ) -> BookingResult<TransitionCommit> {
        let planned = booking.trip.distance_km;
        let actual_distance = payload.actual_distance_km.unwrap_or(planned);
        if !actual_distance.is_finite() || actual_distance < 0.0 {
            return Err(BookingError::Fare {
                source: FareError::InvalidDistance(actual_distance),
                status: Some(booking.status),
            });
        }

        let started_at = booking
            .execution
            .as_ref()
            .map_or(now, |execution| execution.started_at);
        let actual_duration = match payload.actual_duration_min {
            Some(minutes) if minutes < 0 => {
                return Err(BookingError::InvalidPayload {
                    reason: format!("negative trip duration {minutes}"),
                    status: booking.status,
                });
            }
            Some(minutes) => minutes,
            None => (now - started_at).num_minutes().max(0),
        };

        let final_fare = self.finalize_fare(booking, vehicle, actual_distance, payload.actual_fare)?;

        let mut next = booking.clone();
        next.execution = Some(TripExecution {
            started_at,
            ended_at: Some(now),
            actual_distance_km: Some(actual_distance),
            actual_duration_min: Some(actual_duration),
            final_fare: Some(final_fare),
        });
        next.record(
            BookingStatus::Completed,
            actor,
            payload.reason,
            payload.notes,
            now,
        );

        let driver_id = booking.driver_id.unwrap_or(vehicle.driver_id);
        let mut postings = Vec::new();
        if final_fare > 0 {
            postings.push(
                LedgerPosting::credit(
                    driver_id,
                    EntryKind::TripEarning,
                    final_fare,
                    format!("Trip earnings for {}", booking.number),
                )
                .for_booking(&booking.number),
            );
        }

        Ok(TransitionCommit {
            booking: next,
            expected_status: booking.status,
            expected_payment: booking.payment.status,
            vehicle: Some(VehicleChange::Release {
                vehicle_id: booking.vehicle_id,
                booking: booking.number.clone(),
                trip: Some(TripStats {
                    distance_km: actual_distance,
                    earnings: final_fare,
                }),
            }),
            postings,
        })
    }

    /// Supplied fare wins; otherwise recompute when the distance moved beyond tolerance
    fn finalize_fare(
        &self,
        booking: &Booking,
        vehicle: &Vehicle,
        actual_distance: f64,
        supplied: Option<Money>,
    ) -> BookingResult<Money> {
        if let Some(fare) = supplied {
            if fare < 0 {
                return Err(BookingError::InvalidPayload {
                    reason: format!("negative fare {fare}"),
                    status: booking.status,
                });
            }
            return Ok(fare);
        }

        let planned = booking.trip.distance_km;
        let deviation = if planned > 0.0 {
            (actual_distance - planned).abs() / planned
        } else if actual_distance > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        if deviation <= self.config.fare_recompute_tolerance {
            return Ok(booking.fare);
        }

        let fare = compute_fare(&vehicle.pricing, actual_distance, booking.trip.trip_type)
            .map_err(|source| BookingError::Fare {
                source,
                status: Some(booking.status),
            })?;
        log::debug!(
            "Booking {} fare recomputed for {:.1} km (planned {:.1}): {} -> {}",
            booking.number,
            actual_distance,
            planned,
            booking.fare,
            fare
        );
        Ok(fare)
    }

    fn plan_cancel(
        &self,
        booking: &Booking,
        vehicle: &Vehicle,
        actor: &Actor,
        payload: TransitionPayload,
        now: DateTime<Utc>,
    ) -> TransitionCommit {
        let mut cancellation = plan_cancellation(booking, actor, &payload, now);

        let mut postings = Vec::new();
        let penalty = self.config.driver_cancellation_penalty;
        if actor.role == ActorRole::Driver && booking.status == BookingStatus::Accepted && penalty > 0
        {
            let driver_id = booking.driver_id.unwrap_or(vehicle.driver_id);
            postings.push(
                LedgerPosting::debit(
                    driver_id,
                    EntryKind::Penalty,
                    penalty,
                    format!("Cancellation penalty for {}", booking.number),
                )
                .for_booking(&booking.number),
            );
            cancellation.driver_penalty = penalty;
        }

        let vehicle_change = booking.status.holds_vehicle().then(|| VehicleChange::Release {
            vehicle_id: booking.vehicle_id,
            booking: booking.number.clone(),
            trip: None,
        });

        let mut next = booking.clone();
        next.cancellation = Some(cancellation);
        next.record(
            BookingStatus::Cancelled,
            actor,
            payload.reason,
            payload.notes,
            now,
        );

        TransitionCommit {
            booking: next,
            expected_status: booking.status,
            expected_payment: booking.payment.status,
            vehicle: vehicle_change,
            postings,
        }
    }

    /// Load a booking and its vehicle, hiding bookings the actor has no part in
    async fn load_owned(
        &self,
        actor: &Actor,
        number: &BookingNumber,
    ) -> BookingResult<(Booking, Vehicle)> {
        let booking = self
            .store
            .get_booking(number)
            .await?
            .ok_or_else(|| BookingError::not_found(number))?;
        let vehicle = self.vehicle(booking.vehicle_id).await?;

        let visible = match actor.role {
            ActorRole::Admin => true,
            ActorRole::Rider => booking.rider_id == actor.id,
            ActorRole::Driver => {
                vehicle.driver_id == actor.id || booking.driver_id == Some(actor.id)
            }
        };

        if visible {
            Ok((booking, vehicle))
        } else {
            Err(BookingError::not_found(number))
        }
    }

    async fn vehicle(&self, vehicle_id: VehicleId) -> BookingResult<Vehicle> {
        self.store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| BookingError::NotFound(format!("vehicle {vehicle_id}")))
    }

    /// Best effort; a failed notification never undoes a committed change
    async fn notify(&self, booking: &Booking) {
        let Some(event) = BookingEvent::latest(booking) else {
            return;
        };
        if let Err(err) = self.notifier.notify(&event).await {
            log::warn!("Notification for booking {} failed: {}", booking.number, err);
        }
    }
}

fn check_payable(booking: &Booking, reference: &str) -> BookingResult<()> {
    if booking.status == BookingStatus::Cancelled {
        return Err(BookingError::PaymentRejected(format!(
            "booking {} is cancelled",
            booking.number
        )));
    }
    if booking.payment.is_captured() && booking.payment.reference.as_deref() != Some(reference) {
        return Err(BookingError::PaymentRejected(format!(
            "booking {} is already paid",
            booking.number
        )));
    }
    Ok(())
}
