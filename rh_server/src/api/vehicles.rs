//! Vehicle API handlers.
//!
//! Registration and admin review, driver availability overrides and fare quotes.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use ride_hailing::{
    Money, TripType, Vehicle, VehicleId, VehicleStatus,
    booking::{Actor, BookingNumber},
    vehicle::{NewVehicle, ReviewDecision},
};
use serde::{Deserialize, Serialize};

use super::{AppState, error::ApiResult, middleware::require_admin};

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

/// Status override; `booking` names the booking on whose behalf it is made
#[derive(Debug, Deserialize)]
pub struct AvailabilityRequest {
    pub status: VehicleStatus,
    #[serde(default)]
    pub booking: Option<BookingNumber>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub distance_km: f64,
    #[serde(default = "default_trip_type")]
    pub trip_type: TripType,
}

fn default_trip_type() -> TripType {
    TripType::OneWay
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub vehicle_id: VehicleId,
    pub distance_km: f64,
    pub trip_type: TripType,
    pub fare: Money,
}

/// Register a vehicle; it stays unbookable until an admin approves it.
///
/// Drivers register for themselves; an admin may register on behalf of a driver.
///
/// # Errors
///
/// - `403 Forbidden`: Caller is a rider
/// - `409 Conflict`: Registration number already in use
/// - `422 Unprocessable Entity`: Empty registration, or pricing that does not fit the category
pub async fn register_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<NewVehicle>,
) -> ApiResult<(StatusCode, Json<Vehicle>)> {
    let vehicle = state.tracker.register(&actor, request).await?;
    Ok((StatusCode::CREATED, Json(vehicle)))
}

pub async fn get_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<VehicleId>,
) -> ApiResult<Json<Vehicle>> {
    Ok(Json(state.tracker.get_for(&actor, vehicle_id).await?))
}

/// Approve or reject a registration (admin only)
pub async fn review_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<VehicleId>,
    Json(request): Json<ReviewRequest>,
) -> ApiResult<Json<Vehicle>> {
    require_admin(&actor)?;
    let vehicle = state.tracker.review(vehicle_id, request.decision).await?;
    Ok(Json(vehicle))
}

/// Driver or admin status override.
///
/// # Errors
///
/// - `409 Conflict`: Vehicle is engaged by another booking
/// - `422 Unprocessable Entity`: `booked`, or `in_trip` without a booking
pub async fn set_availability(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<VehicleId>,
    Json(request): Json<AvailabilityRequest>,
) -> ApiResult<Json<Vehicle>> {
    let vehicle = state
        .tracker
        .set_status(&actor, vehicle_id, request.status, request.booking.as_ref())
        .await?;
    Ok(Json(vehicle))
}

/// Clear a hold left behind by a finished booking (admin only).
///
/// A vehicle serving an accepted or started booking answers 409 `vehicle_busy`;
/// that booking has to be completed or cancelled instead.
pub async fn release_vehicle(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(vehicle_id): Path<VehicleId>,
) -> ApiResult<Json<Vehicle>> {
    require_admin(&actor)?;
    let vehicle = state.tracker.mark_available(&actor, vehicle_id, None).await?;
    tracing::warn!(admin = actor.id, vehicle_id, "Vehicle force-released");
    Ok(Json(vehicle))
}

/// Fare for a trip on this vehicle, without booking it
///
/// ```bash
/// curl "http://localhost:8080/api/v1/vehicles/3/quote?distance_km=80&trip_type=return" \
///   -H "x-actor-id: 21" -H "x-actor-role: rider"
/// ```
pub async fn quote_fare(
    State(state): State<AppState>,
    Path(vehicle_id): Path<VehicleId>,
    Query(query): Query<QuoteQuery>,
) -> ApiResult<Json<QuoteResponse>> {
    let fare = state
        .tracker
        .quote(vehicle_id, query.distance_km, query.trip_type)
        .await?;
    Ok(Json(QuoteResponse {
        vehicle_id,
        distance_km: query.distance_km,
        trip_type: query.trip_type,
        fare,
    }))
}
