//! Vehicle data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::booking::BookingNumber;
use crate::fare::{Money, PricingProfile, VehicleCategory};

/// Vehicle ID type
pub type VehicleId = i64;

/// Driver ID type
pub type DriverId = i64;

/// Booking-facing availability of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Booked,
    InTrip,
    Maintenance,
    Offline,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Booked => "booked",
            VehicleStatus::InTrip => "in_trip",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Offline => "offline",
        }
    }

    /// Statuses that must carry a current booking reference
    pub fn is_engaged(&self) -> bool {
        matches!(self, VehicleStatus::Booked | VehicleStatus::InTrip)
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VehicleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(VehicleStatus::Available),
            "booked" => Ok(VehicleStatus::Booked),
            "in_trip" => Ok(VehicleStatus::InTrip),
            "maintenance" => Ok(VehicleStatus::Maintenance),
            "offline" => Ok(VehicleStatus::Offline),
            other => Err(format!("unknown vehicle status: {other}")),
        }
    }
}

/// Admin approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            "rejected" => Ok(ApprovalStatus::Rejected),
            other => Err(format!("unknown approval status: {other}")),
        }
    }
}

/// Admin review decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// Lifetime vehicle statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleStats {
    pub total_trips: i64,
    pub total_distance_km: f64,
    pub total_earnings: Money,
}

/// Contribution of one completed trip to vehicle statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripStats {
    pub distance_km: f64,
    pub earnings: Money,
}

/// The part of a vehicle the resource tracker owns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleSlot {
    pub status: VehicleStatus,
    pub current_booking: Option<BookingNumber>,
}

impl VehicleSlot {
    pub fn available() -> Self {
        Self {
            status: VehicleStatus::Available,
            current_booking: None,
        }
    }

    /// `current_booking` is set exactly when the status is booked or in trip
    pub fn is_consistent(&self) -> bool {
        self.status.is_engaged() == self.current_booking.is_some()
    }
}

/// Vehicle document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub registration_number: String,
    pub driver_id: DriverId,
    pub category: VehicleCategory,
    pub pricing: PricingProfile,
    pub status: VehicleStatus,
    pub current_booking: Option<BookingNumber>,
    pub approval: ApprovalStatus,
    pub is_active: bool,
    pub is_verified: bool,
    pub stats: VehicleStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn slot(&self) -> VehicleSlot {
        VehicleSlot {
            status: self.status,
            current_booking: self.current_booking.clone(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }

    pub fn is_booked(&self) -> bool {
        self.status.is_engaged()
    }

    /// Active, verified and approved by an admin
    pub fn is_bookable(&self) -> bool {
        self.is_active && self.is_verified && self.approval == ApprovalStatus::Approved
    }

    /// Whether a reservation may be taken right now
    pub fn can_reserve(&self) -> bool {
        self.is_available() && self.is_bookable()
    }
}

/// Vehicle registration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVehicle {
    pub driver_id: DriverId,
    pub registration_number: String,
    pub category: VehicleCategory,
    pub pricing: PricingProfile,
}
