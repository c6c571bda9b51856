//! API error responses.
//!
//! Every engine error is rendered as
//! `{"error": kind, "message": ..., "status": current_booking_status?}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ride_hailing::{
    BookingError, BookingStatus, LedgerError, RefundError, VehicleError,
    booking::ActorRole,
};
use serde::Serialize;

/// Error body returned by every endpoint
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookingStatus>,
}

/// Handler error: an HTTP status plus the JSON body
#[derive(Debug)]
pub struct ApiError {
    pub code: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            code: status_for_kind(kind),
            body: ErrorResponse {
                error: kind,
                message: message.into(),
                status: None,
            },
        }
    }

    pub fn forbidden(role: ActorRole) -> Self {
        Self::new("forbidden", format!("Not permitted for role {role}"))
    }

    fn with_status(mut self, status: Option<BookingStatus>) -> Self {
        self.body.status = status;
        self
    }

    pub fn kind(&self) -> &'static str {
        self.body.error
    }
}

/// HTTP status for an error kind
pub fn status_for_kind(kind: &str) -> StatusCode {
    match kind {
        "not_found" => StatusCode::NOT_FOUND,
        "unauthorized" => StatusCode::UNAUTHORIZED,
        "forbidden" => StatusCode::FORBIDDEN,
        "invalid_transition"
        | "vehicle_unavailable"
        | "vehicle_busy"
        | "conflict"
        | "already_refunded"
        | "duplicate_registration" => StatusCode::CONFLICT,
        "insufficient_balance" => StatusCode::PAYMENT_REQUIRED,
        "pricing_unavailable"
        | "invalid_distance"
        | "invalid_payload"
        | "invalid_amount"
        | "below_minimum_withdrawal"
        | "vehicle_not_bookable"
        | "invalid_registration"
        | "invalid_status"
        | "missing_payment"
        | "payment_rejected" => StatusCode::UNPROCESSABLE_ENTITY,
        "gateway_error" => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.code.is_server_error() {
            tracing::error!(kind = self.body.error, "{}", self.body.message);
        }
        (self.code, Json(self.body)).into_response()
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        if matches!(err, BookingError::Store(_) | BookingError::Gateway(_)) {
            tracing::error!("Booking operation failed: {err}");
        }
        ApiError::new(err.kind(), err.client_message()).with_status(err.current_status())
    }
}

impl From<VehicleError> for ApiError {
    fn from(err: VehicleError) -> Self {
        if matches!(err, VehicleError::Store(_)) {
            tracing::error!("Vehicle operation failed: {err}");
        }
        ApiError::new(err.kind(), err.client_message())
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        if matches!(err, LedgerError::Store(_)) {
            tracing::error!("Ledger operation failed: {err}");
        }
        ApiError::new(err.kind(), err.client_message())
    }
}

impl From<RefundError> for ApiError {
    fn from(err: RefundError) -> Self {
        if matches!(err, RefundError::Store(_) | RefundError::Gateway(_)) {
            tracing::error!("Refund operation failed: {err}");
        }
        let status = match &err {
            RefundError::NotCancelled { status, .. } => Some(*status),
            _ => None,
        };
        ApiError::new(err.kind(), err.client_message()).with_status(status)
    }
}

/// Result type for handlers
pub type ApiResult<T> = Result<T, ApiError>;
