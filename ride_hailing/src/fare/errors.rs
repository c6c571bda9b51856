//! Fare error types.

use thiserror::Error;

use super::models::{DistanceTier, TripType};

/// Fare calculation errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FareError {
    /// No rate configured for the trip type (and tier, for tiered profiles)
    #[error("Pricing unavailable for {trip_type} trips{}", tier_suffix(.tier))]
    PricingUnavailable {
        trip_type: TripType,
        tier: Option<DistanceTier>,
    },

    /// Distance is negative or not a finite number
    #[error("Invalid trip distance: {0} km")]
    InvalidDistance(f64),
}

fn tier_suffix(tier: &Option<DistanceTier>) -> String {
    tier.map(|t| format!(" in the {t} tier")).unwrap_or_default()
}

/// Result type for fare operations
pub type FareResult<T> = Result<T, FareError>;
