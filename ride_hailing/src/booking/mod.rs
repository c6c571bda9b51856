//! Booking lifecycle.
//!
//! A booking moves `pending -> accepted -> started -> completed`, or to
//! `cancelled` from `pending`/`accepted`. The transition table in
//! [`state_machine`] is the single authority on which moves are legal and who
//! may request them; [`BookingManager`] applies a legal move together with its
//! side effects (vehicle reservation or release, ledger postings, cancellation
//! record) as one atomic commit.

pub mod errors;
pub mod manager;
pub mod models;
pub mod state_machine;

pub use errors::{BookingError, BookingResult};
pub use manager::BookingManager;
pub use models::{
    Actor, ActorRole, Booking, BookingNumber, BookingStatus, Location, NewBooking, Payment,
    PaymentStatus, RiderId, StatusChange, TransitionPayload, TripDetails, TripExecution,
};
pub use state_machine::{allowed_roles, check_transition, next_statuses};
