//! Pricing data models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whole currency units. Fares never carry fractional paise.
pub type Money = i64;

/// Trip type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    OneWay,
    Return,
}

impl TripType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripType::OneWay => "one_way",
            TripType::Return => "return",
        }
    }
}

impl fmt::Display for TripType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TripType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_way" => Ok(TripType::OneWay),
            "return" => Ok(TripType::Return),
            other => Err(format!("unknown trip type: {other}")),
        }
    }
}

/// Vehicle category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    Auto,
    Car,
    Bus,
}

impl VehicleCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleCategory::Auto => "auto",
            VehicleCategory::Car => "car",
            VehicleCategory::Bus => "bus",
        }
    }
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VehicleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(VehicleCategory::Auto),
            "car" => Ok(VehicleCategory::Car),
            "bus" => Ok(VehicleCategory::Bus),
            other => Err(format!("unknown vehicle category: {other}")),
        }
    }
}

/// Distance tiers used by car and bus pricing tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DistanceTier {
    Km50,
    Km100,
    Km150,
    Km200,
    Km250,
    Km300,
}

impl DistanceTier {
    /// All tiers in ascending boundary order
    pub const ALL: [DistanceTier; 6] = [
        DistanceTier::Km50,
        DistanceTier::Km100,
        DistanceTier::Km150,
        DistanceTier::Km200,
        DistanceTier::Km250,
        DistanceTier::Km300,
    ];

    /// Upper boundary of the tier in kilometres
    pub fn boundary_km(&self) -> f64 {
        match self {
            DistanceTier::Km50 => 50.0,
            DistanceTier::Km100 => 100.0,
            DistanceTier::Km150 => 150.0,
            DistanceTier::Km200 => 200.0,
            DistanceTier::Km250 => 250.0,
            DistanceTier::Km300 => 300.0,
        }
    }

    /// Smallest tier whose boundary covers `distance_km`, else the 300 km tier
    pub fn for_distance(distance_km: f64) -> DistanceTier {
        Self::ALL
            .into_iter()
            .find(|tier| distance_km <= tier.boundary_km())
            .unwrap_or(DistanceTier::Km300)
    }
}

impl fmt::Display for DistanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} km", self.boundary_km())
    }
}

/// Per-km rates for each distance tier. Missing tiers are unpriced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierRates {
    pub up_to_50: Option<f64>,
    pub up_to_100: Option<f64>,
    pub up_to_150: Option<f64>,
    pub up_to_200: Option<f64>,
    pub up_to_250: Option<f64>,
    pub up_to_300: Option<f64>,
}

impl TierRates {
    pub fn rate(&self, tier: DistanceTier) -> Option<f64> {
        match tier {
            DistanceTier::Km50 => self.up_to_50,
            DistanceTier::Km100 => self.up_to_100,
            DistanceTier::Km150 => self.up_to_150,
            DistanceTier::Km200 => self.up_to_200,
            DistanceTier::Km250 => self.up_to_250,
            DistanceTier::Km300 => self.up_to_300,
        }
    }

    /// Builder-style setter, mostly for fixtures
    pub fn with(mut self, tier: DistanceTier, rate: f64) -> Self {
        let slot = match tier {
            DistanceTier::Km50 => &mut self.up_to_50,
            DistanceTier::Km100 => &mut self.up_to_100,
            DistanceTier::Km150 => &mut self.up_to_150,
            DistanceTier::Km200 => &mut self.up_to_200,
            DistanceTier::Km250 => &mut self.up_to_250,
            DistanceTier::Km300 => &mut self.up_to_300,
        };
        *slot = Some(rate);
        self
    }
}

/// Vehicle pricing profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingProfile {
    /// Flat per-km rate (auto rickshaws)
    Auto {
        one_way_per_km: Option<f64>,
        return_per_km: Option<f64>,
    },
    /// Distance-tiered per-km rates (cars, buses)
    Tiered {
        one_way: TierRates,
        return_trip: TierRates,
    },
}

impl PricingProfile {
    pub fn auto(one_way_per_km: f64, return_per_km: f64) -> Self {
        PricingProfile::Auto {
            one_way_per_km: Some(one_way_per_km),
            return_per_km: Some(return_per_km),
        }
    }

    pub fn tiered(one_way: TierRates, return_trip: TierRates) -> Self {
        PricingProfile::Tiered {
            one_way,
            return_trip,
        }
    }

    /// Whether this profile shape is valid for the category
    pub fn fits(&self, category: VehicleCategory) -> bool {
        matches!(
            (self, category),
            (PricingProfile::Auto { .. }, VehicleCategory::Auto)
                | (
                    PricingProfile::Tiered { .. },
                    VehicleCategory::Car | VehicleCategory::Bus
                )
        )
    }
}
