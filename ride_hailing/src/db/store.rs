//! Storage trait for the booking core.
//!
//! Every write that must be atomic is a single trait call: the implementation
//! either applies all of it or none of it. Reservation and booking status writes
//! are compare-and-set against the stored record, never read-then-write.

use async_trait::async_trait;
use thiserror::Error;

use crate::booking::{Booking, BookingNumber, BookingStatus, Payment, PaymentStatus};
use crate::fare::Money;
use crate::ledger::{LedgerEntry, LedgerPosting, Wallet, Withdrawal};
use crate::refund::{Cancellation, RefundStatus};
use crate::vehicle::{
    ApprovalStatus, DriverId, NewVehicle, TripStats, Vehicle, VehicleId, VehicleSlot,
};

/// Storage errors, including the conditional-update rejections callers map to domain errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedded document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored value does not parse into its domain type
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    /// Operation exceeded its time budget
    #[error("Storage operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Vehicle not found: {0}")]
    VehicleNotFound(VehicleId),

    #[error("Booking not found: {0}")]
    BookingNotFound(BookingNumber),

    /// Unique key already present
    #[error("Duplicate key: {0}")]
    Duplicate(String),

    /// Conditional reservation update matched no row
    #[error("Vehicle {0} is not available")]
    VehicleUnavailable(VehicleId),

    /// Booking status changed since it was read
    #[error("Booking {number} is now {current}")]
    StaleBooking {
        number: BookingNumber,
        current: BookingStatus,
    },

    /// Payment was recorded after the transition was planned
    #[error("Booking {0} payment changed")]
    PaymentChanged(BookingNumber),

    /// Guarded debit rejected
    #[error("Insufficient balance for driver {driver_id}: available {available}, required {required}")]
    InsufficientBalance {
        driver_id: DriverId,
        available: Money,
        required: Money,
    },
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Vehicle side effect of a booking transition
#[derive(Debug, Clone, PartialEq)]
pub enum VehicleChange {
    /// `available -> booked`, only if the vehicle is available, active, verified and approved
    Reserve {
        vehicle_id: VehicleId,
        booking: BookingNumber,
    },
    /// `booked -> in_trip`, only while the vehicle is held by `booking`.
    /// A vehicle already put `in_trip` for the same booking also matches.
    StartTrip {
        vehicle_id: VehicleId,
        booking: BookingNumber,
    },
    /// Back to `available` if still held by `booking`; optionally books trip statistics
    Release {
        vehicle_id: VehicleId,
        booking: BookingNumber,
        trip: Option<TripStats>,
    },
}

/// Everything one booking transition writes
#[derive(Debug, Clone)]
pub struct TransitionCommit {
    /// Booking as it must look after the transition
    pub booking: Booking,
    /// Status the booking must still have for the commit to apply
    pub expected_status: BookingStatus,
    /// Payment status the plan was computed against
    pub expected_payment: PaymentStatus,
    pub vehicle: Option<VehicleChange>,
    pub postings: Vec<LedgerPosting>,
}

/// Persistence layer for bookings, vehicles and driver wallets
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert a vehicle: approval `pending`, unverified, status `available`
    async fn insert_vehicle(&self, vehicle: &NewVehicle) -> StoreResult<Vehicle>;

    async fn get_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Option<Vehicle>>;

    /// Set approval; approving also marks the vehicle verified
    async fn set_vehicle_approval(
        &self,
        vehicle_id: VehicleId,
        approval: ApprovalStatus,
    ) -> StoreResult<Vehicle>;

    /// Compare-and-set reservation. Returns `false` if the vehicle cannot be reserved.
    async fn reserve_vehicle(
        &self,
        vehicle_id: VehicleId,
        booking: &BookingNumber,
    ) -> StoreResult<bool>;

    /// Unconditional release to `available`
    async fn release_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<()>;

    /// Compare-and-set of the tracker-owned slot. Returns `false` if `expected` no longer holds.
    async fn swap_vehicle_slot(
        &self,
        vehicle_id: VehicleId,
        expected: &VehicleSlot,
        next: &VehicleSlot,
    ) -> StoreResult<bool>;

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()>;

    async fn get_booking(&self, number: &BookingNumber) -> StoreResult<Option<Booking>>;

    async fn bookings_for_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Vec<Booking>>;

    /// Apply a transition atomically.
    ///
    /// Order of checks: vehicle change, booking status, payment status, ledger
    /// postings. Any failure leaves every record untouched. The stored payment is
    /// never overwritten by a commit.
    ///
    /// # Errors
    ///
    /// * `StoreError::VehicleUnavailable` - Reservation or trip start lost, or another
    ///   booking already holds the vehicle
    /// * `StoreError::StaleBooking` - Booking status moved since it was read
    /// * `StoreError::PaymentChanged` - Payment recorded since the booking was read
    /// * `StoreError::InsufficientBalance` - A debit posting exceeds the balance
    async fn commit_transition(&self, commit: &TransitionCommit) -> StoreResult<()>;

    /// Mark a booking paid unless it is cancelled or already paid. Returns `false` otherwise.
    async fn mark_paid(&self, number: &BookingNumber, payment: &Payment) -> StoreResult<bool>;

    /// Compare-and-set of the refund sub-state. Returns `false` if the stored refund status differs.
    async fn swap_refund(
        &self,
        number: &BookingNumber,
        expected: RefundStatus,
        next: &Cancellation,
    ) -> StoreResult<bool>;

    /// Wallet for a driver; drivers without entries have a zero balance
    async fn get_wallet(&self, driver_id: DriverId) -> StoreResult<Wallet>;

    /// Append postings atomically; debits are guarded against overdraft
    async fn post_entries(&self, postings: &[LedgerPosting]) -> StoreResult<Vec<LedgerEntry>>;

    /// Most recent entries first
    async fn list_entries(&self, driver_id: DriverId, limit: i64) -> StoreResult<Vec<LedgerEntry>>;

    /// Debit the wallet and queue a pending withdrawal in one step
    async fn request_withdrawal(&self, posting: &LedgerPosting) -> StoreResult<Withdrawal>;

    async fn list_withdrawals(&self, driver_id: DriverId) -> StoreResult<Vec<Withdrawal>>;

    async fn health_check(&self) -> StoreResult<()>;
}
