//! Booking data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::fare::{Money, TripType};
use crate::refund::Cancellation;
use crate::vehicle::{DriverId, VehicleId};

/// Rider ID type
pub type RiderId = i64;

/// Unique, human-readable booking number (e.g. `BK7F3A91C04D2E`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingNumber(String);

impl BookingNumber {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh booking number
    pub fn generate() -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        Self(format!("BK{}", &id[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Accepted,
    Started,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::Started => "started",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Completed and cancelled bookings never move again
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// Statuses during which the booking holds its vehicle
    pub fn holds_vehicle(&self) -> bool {
        matches!(self, BookingStatus::Accepted | BookingStatus::Started)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "accepted" => Ok(BookingStatus::Accepted),
            "started" => Ok(BookingStatus::Started),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            other => Err(format!("unknown booking status: {other}")),
        }
    }
}

/// Role of the authenticated actor, supplied by the upstream auth layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Rider,
    Driver,
    Admin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Rider => "rider",
            ActorRole::Driver => "driver",
            ActorRole::Admin => "admin",
        }
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rider" | "user" => Ok(ActorRole::Rider),
            "driver" => Ok(ActorRole::Driver),
            "admin" => Ok(ActorRole::Admin),
            other => Err(format!("unknown actor role: {other}")),
        }
    }
}

/// Authenticated actor (who is asking)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub role: ActorRole,
}

impl Actor {
    pub fn rider(id: RiderId) -> Self {
        Self {
            id,
            role: ActorRole::Rider,
        }
    }

    pub fn driver(id: DriverId) -> Self {
        Self {
            id,
            role: ActorRole::Driver,
        }
    }

    pub fn admin(id: i64) -> Self {
        Self {
            id,
            role: ActorRole::Admin,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }
}

/// Geographic point with a display address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: String,
}

/// Planned trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetails {
    pub pickup: Location,
    pub destination: Location,
    pub scheduled_at: DateTime<Utc>,
    pub distance_km: f64,
    pub trip_type: TripType,
}

/// One entry of the append-only status history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChange {
    pub status: BookingStatus,
    pub at: DateTime<Utc>,
    pub actor_id: i64,
    pub actor_role: ActorRole,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

/// Trip execution record, filled from `started` onwards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripExecution {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub actual_distance_km: Option<f64>,
    pub actual_duration_min: Option<i64>,
    pub final_fare: Option<Money>,
}

/// Payment capture status as known to the booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
        }
    }
}

/// Payment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub status: PaymentStatus,
    pub reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    pub fn unpaid() -> Self {
        Self {
            status: PaymentStatus::Unpaid,
            reference: None,
            paid_at: None,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// Booking document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub number: BookingNumber,
    pub rider_id: RiderId,
    pub driver_id: Option<DriverId>,
    pub vehicle_id: VehicleId,
    pub trip: TripDetails,
    /// Fare snapshot taken at creation; never rewritten
    pub fare: Money,
    pub status: BookingStatus,
    pub history: Vec<StatusChange>,
    pub execution: Option<TripExecution>,
    pub cancellation: Option<Cancellation>,
    pub payment: Payment,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Create a pending booking with its first history entry
    pub fn pending(
        number: BookingNumber,
        rider_id: RiderId,
        vehicle_id: VehicleId,
        trip: TripDetails,
        fare: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            number,
            rider_id,
            driver_id: None,
            vehicle_id,
            trip,
            fare,
            status: BookingStatus::Pending,
            history: vec![StatusChange {
                status: BookingStatus::Pending,
                at: now,
                actor_id: rider_id,
                actor_role: ActorRole::Rider,
                reason: None,
                notes: None,
            }],
            execution: None,
            cancellation: None,
            payment: Payment::unpaid(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status`, appending the matching history entry.
    ///
    /// This is the only place a booking's status is written.
    pub(crate) fn record(
        &mut self,
        status: BookingStatus,
        actor: &Actor,
        reason: Option<String>,
        notes: Option<String>,
        at: DateTime<Utc>,
    ) {
        self.history.push(StatusChange {
            status,
            at,
            actor_id: actor.id,
            actor_role: actor.role,
            reason,
            notes,
        });
        self.status = status;
        self.updated_at = at;
    }

    /// Last history entry matches the current status
    pub fn history_is_consistent(&self) -> bool {
        self.history.last().map(|entry| entry.status) == Some(self.status)
    }

    /// Final fare if completed, otherwise the snapshot
    pub fn settled_fare(&self) -> Money {
        self.execution
            .as_ref()
            .and_then(|e| e.final_fare)
            .unwrap_or(self.fare)
    }
}

/// Booking request from a rider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub vehicle_id: VehicleId,
    pub trip: TripDetails,
}

/// Optional data carried by a transition request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionPayload {
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub actual_distance_km: Option<f64>,
    pub actual_duration_min: Option<i64>,
    pub actual_fare: Option<Money>,
    /// Admin-only deduction applied to a rider refund on cancellation
    pub refund_deduction: Option<Money>,
}

impl TransitionPayload {
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip() -> TripDetails {
        TripDetails {
            pickup: Location {
                latitude: 12.97,
                longitude: 77.59,
                address: "MG Road".to_string(),
            },
            destination: Location {
                latitude: 13.19,
                longitude: 77.70,
                address: "Airport".to_string(),
            },
            scheduled_at: Utc::now(),
            distance_km: 35.0,
            trip_type: TripType::OneWay,
        }
    }

    #[test]
    fn test_booking_number_format() {
        let number = BookingNumber::generate();
        assert!(number.as_str().starts_with("BK"));
        assert_eq!(number.as_str().len(), 14);
        assert_ne!(number, BookingNumber::generate());
    }

    #[test]
    fn test_pending_booking_history_starts_consistent() {
        let booking = Booking::pending(BookingNumber::generate(), 7, 3, trip(), 500, Utc::now());
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.history.len(), 1);
        assert!(booking.history_is_consistent());
    }

    #[test]
    fn test_record_appends_and_updates_status() {
        let mut booking =
            Booking::pending(BookingNumber::generate(), 7, 3, trip(), 500, Utc::now());
        booking.record(
            BookingStatus::Accepted,
            &Actor::driver(11),
            None,
            None,
            Utc::now(),
        );
        assert_eq!(booking.status, BookingStatus::Accepted);
        assert_eq!(booking.history.len(), 2);
        assert_eq!(booking.history[1].actor_role, ActorRole::Driver);
        assert!(booking.history_is_consistent());
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::Started,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>(), Ok(status));
        }
        assert!("archived".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_role_parsing_accepts_user_alias() {
        assert_eq!("user".parse::<ActorRole>(), Ok(ActorRole::Rider));
        assert_eq!("Driver".parse::<ActorRole>(), Ok(ActorRole::Driver));
    }
}
