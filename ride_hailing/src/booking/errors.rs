//! Booking error types.

use thiserror::Error;

use super::models::{ActorRole, BookingNumber, BookingStatus};
use crate::db::StoreError;
use crate::fare::{FareError, Money};
use crate::gateway::GatewayError;
use crate::vehicle::{DriverId, VehicleId};

/// Booking errors.
///
/// Errors raised while handling a transition carry the booking's current status,
/// which is left unchanged.
#[derive(Debug, Error)]
pub enum BookingError {
    /// Booking (or its vehicle) missing, or not visible to the actor
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transition not in the table for this role
    #[error("Cannot move booking from {from} to {to} as {role}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
        role: ActorRole,
    },

    /// Lost the reservation race; retry with another vehicle
    #[error("Vehicle {vehicle_id} is unavailable")]
    VehicleUnavailable {
        vehicle_id: VehicleId,
        status: BookingStatus,
    },

    /// Vehicle is not approved, verified and active
    #[error("Vehicle {0} is not open for bookings")]
    VehicleNotBookable(VehicleId),

    /// Fare could not be computed
    #[error("{source}")]
    Fare {
        #[source]
        source: FareError,
        status: Option<BookingStatus>,
    },

    /// A penalty debit exceeded the driver's balance
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        driver_id: DriverId,
        available: Money,
        required: Money,
        status: BookingStatus,
    },

    /// Malformed transition payload
    #[error("Invalid payload: {reason}")]
    InvalidPayload {
        reason: String,
        status: BookingStatus,
    },

    /// Role may not perform this operation
    #[error("A {0} cannot do this")]
    Forbidden(ActorRole),

    /// Booking kept changing underneath the commit
    #[error("Booking is being updated concurrently, try again")]
    Contended { status: BookingStatus },

    /// Payment could not be recorded
    #[error("Payment rejected: {0}")]
    PaymentRejected(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<FareError> for BookingError {
    fn from(source: FareError) -> Self {
        BookingError::Fare {
            source,
            status: None,
        }
    }
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BookingNotFound(number) => BookingError::NotFound(number.to_string()),
            StoreError::VehicleNotFound(id) => BookingError::NotFound(format!("vehicle {id}")),
            other => BookingError::Store(other),
        }
    }
}

impl BookingError {
    pub(crate) fn not_found(number: &BookingNumber) -> Self {
        BookingError::NotFound(number.to_string())
    }

    /// Map a rejected commit to the caller-facing error
    pub(crate) fn from_commit(
        err: StoreError,
        status: BookingStatus,
        to: BookingStatus,
        role: ActorRole,
    ) -> Self {
        match err {
            StoreError::VehicleUnavailable(vehicle_id) => {
                BookingError::VehicleUnavailable { vehicle_id, status }
            }
            // Someone else moved the booking first
            StoreError::StaleBooking { current, .. } => BookingError::InvalidTransition {
                from: current,
                to,
                role,
            },
            StoreError::InsufficientBalance {
                driver_id,
                available,
                required,
            } => BookingError::InsufficientBalance {
                driver_id,
                available,
                required,
                status,
            },
            other => other.into(),
        }
    }

    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            BookingError::NotFound(_) => "not_found",
            BookingError::InvalidTransition { .. } => "invalid_transition",
            BookingError::VehicleUnavailable { .. } => "vehicle_unavailable",
            BookingError::VehicleNotBookable(_) => "vehicle_not_bookable",
            BookingError::Fare {
                source: FareError::PricingUnavailable { .. },
                ..
            } => "pricing_unavailable",
            BookingError::Fare {
                source: FareError::InvalidDistance(_),
                ..
            } => "invalid_distance",
            BookingError::InsufficientBalance { .. } => "insufficient_balance",
            BookingError::InvalidPayload { .. } => "invalid_payload",
            BookingError::Forbidden(_) => "forbidden",
            BookingError::Contended { .. } => "conflict",
            BookingError::PaymentRejected(_) => "payment_rejected",
            BookingError::Gateway(_) => "gateway_error",
            BookingError::Store(_) => "internal",
        }
    }

    /// Booking status at the time of the rejection, when known
    pub fn current_status(&self) -> Option<BookingStatus> {
        match self {
            BookingError::InvalidTransition { from, .. } => Some(*from),
            BookingError::VehicleUnavailable { status, .. }
            | BookingError::InsufficientBalance { status, .. }
            | BookingError::Contended { status }
            | BookingError::InvalidPayload { status, .. } => Some(*status),
            BookingError::Fare { status, .. } => *status,
            _ => None,
        }
    }

    /// Client-safe message; storage and gateway details stay in the logs
    pub fn client_message(&self) -> String {
        match self {
            BookingError::Store(_) => "Internal server error".to_string(),
            BookingError::Gateway(_) => "Payment gateway unavailable".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for booking operations
pub type BookingResult<T> = Result<T, BookingError>;
