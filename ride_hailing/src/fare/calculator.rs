//! Fare computation.

use super::errors::{FareError, FareResult};
use super::models::{DistanceTier, Money, PricingProfile, TripType};

/// Compute the fare for a trip.
///
/// The result is rounded to the nearest whole currency unit. The function is pure:
/// identical inputs always produce the identical fare.
///
/// # Errors
///
/// * `FareError::PricingUnavailable` - No usable rate for the trip type / tier
/// * `FareError::InvalidDistance` - Distance is negative, NaN or infinite
pub fn compute_fare(
    profile: &PricingProfile,
    distance_km: f64,
    trip_type: TripType,
) -> FareResult<Money> {
    if !distance_km.is_finite() || distance_km < 0.0 {
        return Err(FareError::InvalidDistance(distance_km));
    }

    let rate = per_km_rate(profile, distance_km, trip_type)?;
    Ok((rate * distance_km).round() as Money)
}

fn per_km_rate(profile: &PricingProfile, distance_km: f64, trip_type: TripType) -> FareResult<f64> {
    let (rate, tier) = match profile {
        PricingProfile::Auto {
            one_way_per_km,
            return_per_km,
        } => {
            let rate = match trip_type {
                TripType::OneWay => *one_way_per_km,
                TripType::Return => *return_per_km,
            };
            (rate, None)
        }
        PricingProfile::Tiered {
            one_way,
            return_trip,
        } => {
            let tier = DistanceTier::for_distance(distance_km);
            let table = match trip_type {
                TripType::OneWay => one_way,
                TripType::Return => return_trip,
            };
            (table.rate(tier), Some(tier))
        }
    };

    // A negative or non-finite rate is a misconfiguration, not a discount
    rate.filter(|r| r.is_finite() && *r >= 0.0)
        .ok_or(FareError::PricingUnavailable { trip_type, tier })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fare::models::TierRates;

    fn tiered_one_way(rates: &[(DistanceTier, f64)]) -> PricingProfile {
        let one_way = rates
            .iter()
            .fold(TierRates::default(), |acc, (tier, rate)| acc.with(*tier, *rate));
        PricingProfile::tiered(one_way, TierRates::default())
    }

    #[test]
    fn test_auto_fare_is_rate_times_distance() {
        let profile = PricingProfile::auto(15.0, 25.0);
        assert_eq!(compute_fare(&profile, 10.0, TripType::OneWay), Ok(150));
        assert_eq!(compute_fare(&profile, 10.0, TripType::Return), Ok(250));
    }

    #[test]
    fn test_tier_uses_smallest_covering_boundary() {
        let profile = tiered_one_way(&[(DistanceTier::Km50, 20.0), (DistanceTier::Km100, 18.0)]);
        assert_eq!(compute_fare(&profile, 80.0, TripType::OneWay), Ok(1440));
        assert_eq!(compute_fare(&profile, 50.0, TripType::OneWay), Ok(1000));
        assert_eq!(compute_fare(&profile, 100.0, TripType::OneWay), Ok(1800));
    }

    #[test]
    fn test_long_trips_fall_back_to_top_tier() {
        let profile = tiered_one_way(&[(DistanceTier::Km300, 12.0)]);
        assert_eq!(compute_fare(&profile, 420.0, TripType::OneWay), Ok(5040));
    }

    #[test]
    fn test_missing_tier_is_pricing_unavailable() {
        let profile = tiered_one_way(&[(DistanceTier::Km50, 20.0)]);
        assert_eq!(
            compute_fare(&profile, 120.0, TripType::OneWay),
            Err(FareError::PricingUnavailable {
                trip_type: TripType::OneWay,
                tier: Some(DistanceTier::Km150),
            })
        );
        assert!(matches!(
            compute_fare(&profile, 20.0, TripType::Return),
            Err(FareError::PricingUnavailable { .. })
        ));
    }

    #[test]
    fn test_missing_auto_rate_is_pricing_unavailable() {
        let profile = PricingProfile::Auto {
            one_way_per_km: Some(12.0),
            return_per_km: None,
        };
        assert_eq!(
            compute_fare(&profile, 5.0, TripType::Return),
            Err(FareError::PricingUnavailable {
                trip_type: TripType::Return,
                tier: None,
            })
        );
    }

    #[test]
    fn test_fare_rounds_to_whole_units() {
        let profile = PricingProfile::auto(12.5, 12.5);
        assert_eq!(compute_fare(&profile, 3.3, TripType::OneWay), Ok(41));
        assert_eq!(compute_fare(&profile, 3.5, TripType::OneWay), Ok(44));
    }

    #[test]
    fn test_zero_distance_is_free() {
        let profile = PricingProfile::auto(15.0, 15.0);
        assert_eq!(compute_fare(&profile, 0.0, TripType::OneWay), Ok(0));
    }

    #[test]
    fn test_negative_and_nan_distance_rejected() {
        let profile = PricingProfile::auto(15.0, 15.0);
        assert!(matches!(
            compute_fare(&profile, -1.0, TripType::OneWay),
            Err(FareError::InvalidDistance(_))
        ));
        assert!(matches!(
            compute_fare(&profile, f64::NAN, TripType::OneWay),
            Err(FareError::InvalidDistance(_))
        ));
    }

    #[test]
    fn test_negative_rate_is_misconfiguration() {
        let profile = PricingProfile::auto(-3.0, 10.0);
        assert!(matches!(
            compute_fare(&profile, 4.0, TripType::OneWay),
            Err(FareError::PricingUnavailable { .. })
        ));
    }
}
