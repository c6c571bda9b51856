//! Booking status-change notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::booking::{ActorRole, Booking, BookingNumber, BookingStatus, RiderId};
use crate::vehicle::{DriverId, VehicleId};

/// A committed booking transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingEvent {
    pub number: BookingNumber,
    pub status: BookingStatus,
    pub actor_id: i64,
    pub actor_role: ActorRole,
    pub rider_id: RiderId,
    pub driver_id: Option<DriverId>,
    pub vehicle_id: VehicleId,
    pub at: DateTime<Utc>,
}

impl BookingEvent {
    /// Event for the booking's latest history entry
    pub fn latest(booking: &Booking) -> Option<Self> {
        let change = booking.history.last()?;
        Some(Self {
            number: booking.number.clone(),
            status: change.status,
            actor_id: change.actor_id,
            actor_role: change.actor_role,
            rider_id: booking.rider_id,
            driver_id: booking.driver_id,
            vehicle_id: booking.vehicle_id,
            at: change.at,
        })
    }
}

#[derive(Debug, Error)]
#[error("Notification failed: {0}")]
pub struct NotifyError(pub String);

/// Outbound status-change messages (SMS, push, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &BookingEvent) -> Result<(), NotifyError>;
}

/// Notifier that only writes a log line
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &BookingEvent) -> Result<(), NotifyError> {
        log::info!(
            "Booking {} is now {} (by {} {})",
            event.number,
            event.status,
            event.actor_role,
            event.actor_id
        );
        Ok(())
    }
}
