//! Booking API handlers.
//!
//! Creation, lifecycle transitions, payment recording and refunds. Ownership is
//! enforced by the engine: a booking outside the actor's reach is reported as
//! `404 Not Found`.
//!
//! # Examples
//!
//! Accept a booking as its driver:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/bookings/BK1A2B3C4D/transition \
//!   -H "x-actor-id: 11" -H "x-actor-role: driver" \
//!   -H "Content-Type: application/json" \
//!   -d '{"status": "accepted"}'
//! ```

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use ride_hailing::{
    BookingStatus, RefundMethod, VehicleId,
    booking::{Actor, Booking, BookingNumber, NewBooking, TransitionPayload},
    ledger::EntryKind,
};
use serde::Deserialize;

use super::{
    AppState,
    error::ApiResult,
    middleware::require_admin,
};
use crate::metrics;

/// Transition request: target status plus the optional payload fields
#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub status: BookingStatus,
    #[serde(flatten)]
    pub payload: TransitionPayload,
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct InitiateRefundRequest {
    pub method: RefundMethod,
    /// Bank or manual transfer reference for `manual` refunds
    #[serde(default)]
    pub reference: Option<String>,
}

/// Request a trip.
///
/// Returns `201 Created` with the pending booking and its fare snapshot.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is not a rider
/// - `404 Not Found`: Vehicle doesn't exist
/// - `422 Unprocessable Entity`: Vehicle not bookable, or no rate for the trip
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<NewBooking>,
) -> ApiResult<(StatusCode, Json<Booking>)> {
    let booking = state.bookings.create_booking(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

pub async fn get_booking(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(number): Path<String>,
) -> ApiResult<Json<Booking>> {
    let booking = state
        .bookings
        .get_booking(&actor, &BookingNumber::new(number))
        .await?;
    Ok(Json(booking))
}

/// Booking history of one vehicle (owner driver or admin)
pub async fn list_for_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<VehicleId>,
) -> ApiResult<Json<Vec<Booking>>> {
    let bookings = state
        .bookings
        .bookings_for_vehicle(&actor, vehicle_id)
        .await?;
    Ok(Json(bookings))
}

/// Move a booking to a new status.
///
/// # Request Body
///
/// ```json
/// {
///   "status": "completed",
///   "actual_distance_km": 12.4,
///   "notes": "Toll paid by rider"
/// }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Transition not allowed from the current status, or the
///   vehicle was taken by another booking. The body carries the current status.
/// - `402 Payment Required`: Driver cannot cover the cancellation penalty
pub async fn transition(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(number): Path<String>,
    Json(request): Json<TransitionRequest>,
) -> ApiResult<Json<Booking>> {
    let target = request.status;
    let result = state
        .bookings
        .transition(&BookingNumber::new(number), target, &actor, request.payload)
        .await;

    match result {
        Ok(booking) => {
            metrics::booking_transition(target.as_str(), "ok");
            if target == BookingStatus::Completed && booking.settled_fare() > 0 {
                metrics::ledger_posting(EntryKind::TripEarning.as_str());
            }
            if let Some(cancellation) = &booking.cancellation
                && cancellation.driver_penalty > 0
            {
                metrics::ledger_posting(EntryKind::Penalty.as_str());
            }
            Ok(Json(booking))
        }
        Err(err) => {
            metrics::booking_transition(target.as_str(), err.kind());
            if err.kind() == "vehicle_unavailable" {
                metrics::reservation_conflict();
            }
            Err(err.into())
        }
    }
}

/// Record a captured payment for the booking
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Payment not captured, or booking cancelled
/// - `502 Bad Gateway`: Payment gateway unreachable
pub async fn record_payment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(number): Path<String>,
    Json(request): Json<PaymentRequest>,
) -> ApiResult<Json<Booking>> {
    let booking = state
        .bookings
        .record_payment(&actor, &BookingNumber::new(number), &request.reference)
        .await?;
    Ok(Json(booking))
}

/// Start the refund of a cancelled booking (admin only)
pub async fn initiate_refund(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(number): Path<String>,
    Json(request): Json<InitiateRefundRequest>,
) -> ApiResult<Json<Booking>> {
    require_admin(&actor)?;
    let booking = state
        .refunds
        .initiate_refund(&BookingNumber::new(number), request.method, request.reference)
        .await?;
    metrics::refund_step("initiated");
    Ok(Json(booking))
}

/// Mark the refund as completed (admin only)
pub async fn complete_refund(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(number): Path<String>,
) -> ApiResult<Json<Booking>> {
    require_admin(&actor)?;
    let booking = state
        .refunds
        .complete_refund(&BookingNumber::new(number))
        .await?;
    metrics::refund_step("completed");
    Ok(Json(booking))
}
