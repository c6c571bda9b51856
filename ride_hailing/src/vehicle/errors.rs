//! Vehicle error types.

use thiserror::Error;

use super::models::{VehicleId, VehicleStatus};
use crate::booking::{ActorRole, BookingNumber};
use crate::db::StoreError;
use crate::fare::{FareError, VehicleCategory};

/// Vehicle errors
#[derive(Debug, Error)]
pub enum VehicleError {
    /// Vehicle missing or not owned by the actor
    #[error("Vehicle not found: {0}")]
    NotFound(VehicleId),

    /// Reservation lost: the vehicle is not available
    #[error("Vehicle {vehicle_id} is unavailable")]
    Unavailable { vehicle_id: VehicleId },

    /// Vehicle is serving an active booking
    #[error("Vehicle {vehicle_id} is {status} for booking {booking}")]
    Busy {
        vehicle_id: VehicleId,
        status: VehicleStatus,
        booking: BookingNumber,
    },

    /// Pricing profile shape does not fit the category
    #[error("Pricing profile does not fit a {0} vehicle")]
    PricingMismatch(VehicleCategory),

    /// Registration number already taken
    #[error("Registration number already registered: {0}")]
    DuplicateRegistration(String),

    /// Registration number is empty after normalization
    #[error("Invalid registration number")]
    InvalidRegistration,

    /// Role may not perform this operation
    #[error("A {0} cannot do this")]
    Forbidden(ActorRole),

    /// Booked status is only set by a reservation; in-trip only for the active booking holding the vehicle
    #[error("Cannot set vehicle status to {0} directly")]
    InvalidStatusOverride(VehicleStatus),

    /// Slot kept changing underneath a status override
    #[error("Vehicle {0} is being updated concurrently, try again")]
    Contended(VehicleId),

    /// Fare quote failed
    #[error(transparent)]
    Fare(#[from] FareError),

    /// Storage error
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for VehicleError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VehicleNotFound(id) => VehicleError::NotFound(id),
            StoreError::VehicleUnavailable(vehicle_id) => VehicleError::Unavailable { vehicle_id },
            StoreError::Duplicate(key) => VehicleError::DuplicateRegistration(key),
            other => VehicleError::Store(other),
        }
    }
}

impl VehicleError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            VehicleError::NotFound(_) => "not_found",
            VehicleError::Unavailable { .. } => "vehicle_unavailable",
            VehicleError::Busy { .. } => "vehicle_busy",
            VehicleError::PricingMismatch(_) => "pricing_unavailable",
            VehicleError::DuplicateRegistration(_) => "duplicate_registration",
            VehicleError::InvalidRegistration => "invalid_registration",
            VehicleError::Forbidden(_) => "forbidden",
            VehicleError::InvalidStatusOverride(_) => "invalid_status",
            VehicleError::Contended(_) => "conflict",
            VehicleError::Fare(FareError::PricingUnavailable { .. }) => "pricing_unavailable",
            VehicleError::Fare(FareError::InvalidDistance(_)) => "invalid_distance",
            VehicleError::Store(_) => "internal",
        }
    }

    /// Client-safe message; storage details stay in the logs
    pub fn client_message(&self) -> String {
        match self {
            VehicleError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for vehicle operations
pub type VehicleResult<T> = Result<T, VehicleError>;
