//! Fare calculation for vehicle pricing profiles.
//!
//! Two pricing shapes exist:
//! - **Auto** vehicles charge a flat per-km rate per trip type.
//! - **Car/Bus** vehicles charge a per-km rate picked from a distance tier table
//!   (50, 100, 150, 200, 250, 300 km). The smallest tier boundary that covers the
//!   distance wins; anything past 300 km uses the 300 km rate.
//!
//! ## Example
//!
//! ```
//! use ride_hailing::fare::{compute_fare, PricingProfile, TripType};
//!
//! let profile = PricingProfile::auto(15.0, 18.0);
//! assert_eq!(compute_fare(&profile, 10.0, TripType::OneWay).unwrap(), 150);
//! ```

pub mod calculator;
pub mod errors;
pub mod models;

pub use calculator::compute_fare;
pub use errors::{FareError, FareResult};
pub use models::{DistanceTier, Money, PricingProfile, TierRates, TripType, VehicleCategory};
