//! Vehicles: registration, admin review and the resource tracker that
//! guarantees a vehicle serves at most one active booking.

pub mod errors;
pub mod models;
pub mod tracker;

pub use errors::{VehicleError, VehicleResult};
pub use models::{
    ApprovalStatus, DriverId, NewVehicle, ReviewDecision, TripStats, Vehicle, VehicleId,
    VehicleSlot, VehicleStats, VehicleStatus,
};
pub use tracker::VehicleTracker;
