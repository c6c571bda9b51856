//! Vehicle resource tracker.
//!
//! Owns a vehicle's availability status and current-booking reference. Booking
//! transitions go through `reserve`/`release` (or the `VehicleChange`s the booking
//! manager commits); drivers and admins use the status overrides.

use std::sync::Arc;

use super::{
    errors::{VehicleError, VehicleResult},
    models::{
        ApprovalStatus, NewVehicle, ReviewDecision, Vehicle, VehicleId, VehicleSlot,
        VehicleStatus,
    },
};
use crate::booking::{Actor, ActorRole, BookingNumber};
use crate::db::Store;
use crate::fare::{Money, TripType, compute_fare};

/// Compare-and-set attempts before an override gives up
const MAX_SLOT_RETRIES: usize = 3;

/// Vehicle tracker
#[derive(Clone)]
pub struct VehicleTracker {
    store: Arc<dyn Store>,
}

impl VehicleTracker {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a vehicle, pending admin approval.
    ///
    /// Drivers always register for themselves; admins may register on behalf of
    /// the driver named in the request.
    ///
    /// # Errors
    ///
    /// * `VehicleError::Forbidden` - Riders cannot register vehicles
    /// * `VehicleError::InvalidRegistration` - Blank registration number
    /// * `VehicleError::PricingMismatch` - Flat auto rate on a car/bus or tiers on an auto
    /// * `VehicleError::DuplicateRegistration` - Registration number taken
    pub async fn register(&self, actor: &Actor, mut new: NewVehicle) -> VehicleResult<Vehicle> {
        match actor.role {
            ActorRole::Driver => new.driver_id = actor.id,
            ActorRole::Admin => {}
            ActorRole::Rider => return Err(VehicleError::Forbidden(actor.role)),
        }

        new.registration_number = normalize_registration(&new.registration_number);
        if new.registration_number.is_empty() {
            return Err(VehicleError::InvalidRegistration);
        }

        if !new.pricing.fits(new.category) {
            return Err(VehicleError::PricingMismatch(new.category));
        }

        let vehicle = self.store.insert_vehicle(&new).await?;
        log::info!(
            "Registered {} vehicle {} ({}) for driver {}",
            vehicle.category,
            vehicle.id,
            vehicle.registration_number,
            vehicle.driver_id
        );
        Ok(vehicle)
    }

    pub async fn get(&self, vehicle_id: VehicleId) -> VehicleResult<Vehicle> {
        self.store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or(VehicleError::NotFound(vehicle_id))
    }

    /// Vehicle as seen by `actor`: owners and admins only, everyone else gets `NotFound`
    pub async fn get_for(&self, actor: &Actor, vehicle_id: VehicleId) -> VehicleResult<Vehicle> {
        let vehicle = self.get(vehicle_id).await?;
        if actor.is_admin() || (actor.role == ActorRole::Driver && vehicle.driver_id == actor.id) {
            Ok(vehicle)
        } else {
            Err(VehicleError::NotFound(vehicle_id))
        }
    }

    /// Admin approval decision
    pub async fn review(
        &self,
        vehicle_id: VehicleId,
        decision: ReviewDecision,
    ) -> VehicleResult<Vehicle> {
        let approval = match decision {
            ReviewDecision::Approve => ApprovalStatus::Approved,
            ReviewDecision::Reject => ApprovalStatus::Rejected,
        };
        let vehicle = self.store.set_vehicle_approval(vehicle_id, approval).await?;
        log::info!("Vehicle {vehicle_id} review: {approval}");
        Ok(vehicle)
    }

    /// Reserve an available, bookable vehicle for a booking.
    ///
    /// A single compare-and-set: of two concurrent reservations exactly one wins.
    ///
    /// # Errors
    ///
    /// * `VehicleError::Unavailable` - Vehicle is not available or not bookable
    /// * `VehicleError::NotFound` - No such vehicle
    pub async fn reserve(&self, vehicle_id: VehicleId, booking: &BookingNumber) -> VehicleResult<()> {
        if self.store.reserve_vehicle(vehicle_id, booking).await? {
            log::debug!("Vehicle {vehicle_id} reserved for {booking}");
            Ok(())
        } else {
            log::info!("Reservation of vehicle {vehicle_id} for {booking} lost");
            Err(VehicleError::Unavailable { vehicle_id })
        }
    }

    /// Unconditional release to `available`; releasing a free vehicle is a no-op
    pub async fn release(&self, vehicle_id: VehicleId) -> VehicleResult<()> {
        self.store.release_vehicle(vehicle_id).await?;
        log::debug!("Vehicle {vehicle_id} released");
        Ok(())
    }

    /// Put the vehicle in trip for `booking`, which must be the active booking holding it
    pub async fn mark_in_trip(
        &self,
        actor: &Actor,
        vehicle_id: VehicleId,
        booking: &BookingNumber,
    ) -> VehicleResult<Vehicle> {
        let next = VehicleSlot {
            status: VehicleStatus::InTrip,
            current_booking: Some(booking.clone()),
        };
        self.override_slot(actor, vehicle_id, Some(booking), next).await
    }

    pub async fn mark_offline(
        &self,
        actor: &Actor,
        vehicle_id: VehicleId,
        initiating: Option<&BookingNumber>,
    ) -> VehicleResult<Vehicle> {
        self.set_idle_status(actor, vehicle_id, VehicleStatus::Offline, initiating)
            .await
    }

    pub async fn mark_under_maintenance(
        &self,
        actor: &Actor,
        vehicle_id: VehicleId,
        initiating: Option<&BookingNumber>,
    ) -> VehicleResult<Vehicle> {
        self.set_idle_status(actor, vehicle_id, VehicleStatus::Maintenance, initiating)
            .await
    }

    /// Driver online toggle
    pub async fn mark_available(
        &self,
        actor: &Actor,
        vehicle_id: VehicleId,
        initiating: Option<&BookingNumber>,
    ) -> VehicleResult<Vehicle> {
        self.set_idle_status(actor, vehicle_id, VehicleStatus::Available, initiating)
            .await
    }

    /// Apply a status override by name, as submitted through the API
    pub async fn set_status(
        &self,
        actor: &Actor,
        vehicle_id: VehicleId,
        status: VehicleStatus,
        booking: Option<&BookingNumber>,
    ) -> VehicleResult<Vehicle> {
        match (status, booking) {
            (VehicleStatus::InTrip, Some(booking)) => {
                self.mark_in_trip(actor, vehicle_id, booking).await
            }
            (VehicleStatus::InTrip | VehicleStatus::Booked, _) => {
                Err(VehicleError::InvalidStatusOverride(status))
            }
            (VehicleStatus::Offline, _) => self.mark_offline(actor, vehicle_id, booking).await,
            (VehicleStatus::Maintenance, _) => {
                self.mark_under_maintenance(actor, vehicle_id, booking).await
            }
            (VehicleStatus::Available, _) => self.mark_available(actor, vehicle_id, booking).await,
        }
    }

    /// Fare for a trip on this vehicle's stored pricing profile
    pub async fn quote(
        &self,
        vehicle_id: VehicleId,
        distance_km: f64,
        trip_type: TripType,
    ) -> VehicleResult<Money> {
        let vehicle = self.get(vehicle_id).await?;
        Ok(compute_fare(&vehicle.pricing, distance_km, trip_type)?)
    }

    async fn set_idle_status(
        &self,
        actor: &Actor,
        vehicle_id: VehicleId,
        status: VehicleStatus,
        initiating: Option<&BookingNumber>,
    ) -> VehicleResult<Vehicle> {
        let next = VehicleSlot {
            status,
            current_booking: None,
        };
        self.override_slot(actor, vehicle_id, initiating, next).await
    }

    /// Compare-and-set the slot.
    ///
    /// While the vehicle is held by an accepted or started booking the only
    /// override allowed is that booking's own move to `in_trip`; the hold itself is
    /// released by completing or cancelling the booking. Holds left behind by a
    /// booking that is no longer active can be overridden.
    async fn override_slot(
        &self,
        actor: &Actor,
        vehicle_id: VehicleId,
        initiating: Option<&BookingNumber>,
        next: VehicleSlot,
    ) -> VehicleResult<Vehicle> {
        for _ in 0..MAX_SLOT_RETRIES {
            let vehicle = self.get_for(actor, vehicle_id).await?;
            let held = vehicle
                .current_booking
                .as_ref()
                .filter(|_| vehicle.status.is_engaged());
            let active = match held {
                Some(held) => self.hold_is_active(held).await?,
                None => false,
            };
            let own_trip =
                next.status == VehicleStatus::InTrip && held.is_some() && held == initiating;

            if let Some(held) = held
                && active
                && !own_trip
            {
                return Err(VehicleError::Busy {
                    vehicle_id,
                    status: vehicle.status,
                    booking: held.clone(),
                });
            }
            if next.status == VehicleStatus::InTrip && !(own_trip && active) {
                return Err(VehicleError::InvalidStatusOverride(VehicleStatus::InTrip));
            }

            let expected = vehicle.slot();
            if expected == next {
                return Ok(vehicle);
            }

            if self
                .store
                .swap_vehicle_slot(vehicle_id, &expected, &next)
                .await?
            {
                log::info!(
                    "Vehicle {} {} -> {} by {} {}",
                    vehicle_id,
                    expected.status,
                    next.status,
                    actor.role,
                    actor.id
                );
                return self.get(vehicle_id).await;
            }

            log::debug!("Vehicle {vehicle_id} slot changed during override, retrying");
        }

        Err(VehicleError::Contended(vehicle_id))
    }

    /// Whether `booking` is accepted or started, and so still owns its vehicle
    async fn hold_is_active(&self, booking: &BookingNumber) -> VehicleResult<bool> {
        Ok(self
            .store
            .get_booking(booking)
            .await?
            .is_some_and(|held| held.status.holds_vehicle()))
    }
}

fn normalize_registration(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join("")
        .to_uppercase()
}
