//! # Ride Hailing
//!
//! Booking lifecycle and vehicle allocation engine for a ride-hailing marketplace.
//!
//! Riders request trips on a vehicle and its driver carries each trip through
//! acceptance, start and completion; a trip can be cancelled until it starts.
//! The engine keeps the following consistent with each booking's status:
//!
//! - **Vehicle availability**: a vehicle serves at most one accepted or started
//!   booking. Reservation is a single compare-and-set in storage, so concurrent
//!   accepts on one vehicle produce exactly one winner.
//! - **Driver earnings**: a completed trip credits the driver's wallet; penalties
//!   and withdrawals are guarded debits that never overdraw it.
//! - **Refunds**: a cancellation records what the rider is owed and drives a
//!   one-directional refund sub-state.
//!
//! ## Core Modules
//!
//! - [`fare`]: Pure fare calculation from a vehicle pricing profile
//! - [`vehicle`]: Registration, review and the vehicle resource tracker
//! - [`booking`]: Transition table and the booking manager
//! - [`ledger`]: Driver wallets and withdrawals
//! - [`refund`]: Cancellation planning and refund progression
//! - [`gateway`]: Payment gateway and notification seams
//! - [`db`]: `Store` trait with PostgreSQL and in-memory implementations
//!
//! ## Example
//!
//! ```
//! use ride_hailing::fare::{PricingProfile, TripType, compute_fare};
//!
//! let profile = PricingProfile::auto(15.0, 18.0);
//! assert_eq!(compute_fare(&profile, 10.0, TripType::OneWay), Ok(150));
//! ```

pub mod booking;
pub mod config;
pub mod db;
pub mod fare;
pub mod gateway;
pub mod ledger;
pub mod refund;
pub mod vehicle;

pub use booking::{
    Actor, ActorRole, Booking, BookingError, BookingManager, BookingNumber, BookingStatus,
    TransitionPayload,
};
pub use config::{ConfigError, EngineConfig};
pub use db::{MemoryStore, PgStore, Store};
pub use fare::{FareError, Money, PricingProfile, TripType, compute_fare};
pub use ledger::{Ledger, LedgerError};
pub use refund::{RefundError, RefundManager, RefundMethod, RefundStatus};
pub use vehicle::{Vehicle, VehicleError, VehicleId, VehicleStatus, VehicleTracker};
