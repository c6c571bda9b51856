//! Refund error types.

use thiserror::Error;

use super::models::RefundStatus;
use crate::booking::{BookingNumber, BookingStatus};
use crate::db::StoreError;
use crate::gateway::GatewayError;

/// Refund errors
#[derive(Debug, Error)]
pub enum RefundError {
    /// Booking not found
    #[error("Booking not found: {0}")]
    NotFound(BookingNumber),

    /// Only cancelled bookings carry a refund
    #[error("Booking {number} is {status}, not cancelled")]
    NotCancelled {
        number: BookingNumber,
        status: BookingStatus,
    },

    /// Refund already completed
    #[error("Refund for booking {0} already completed")]
    AlreadyRefunded(BookingNumber),

    /// Refund step out of order
    #[error("Refund cannot move from {from} to {to}")]
    InvalidTransition { from: RefundStatus, to: RefundStatus },

    /// Gateway refund requested but the booking has no payment reference
    #[error("Booking {0} has no captured payment to refund")]
    MissingPaymentReference(BookingNumber),

    /// Payment gateway failure
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Storage error
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RefundError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BookingNotFound(number) => RefundError::NotFound(number),
            other => RefundError::Store(other),
        }
    }
}

impl RefundError {
    pub fn kind(&self) -> &'static str {
        match self {
            RefundError::NotFound(_) => "not_found",
            RefundError::NotCancelled { .. } => "invalid_transition",
            RefundError::AlreadyRefunded(_) => "already_refunded",
            RefundError::InvalidTransition { .. } => "invalid_transition",
            RefundError::MissingPaymentReference(_) => "missing_payment",
            RefundError::Gateway(_) => "gateway_error",
            RefundError::Store(_) => "internal",
        }
    }

    /// Get a client-safe error message
    pub fn client_message(&self) -> String {
        match self {
            RefundError::Store(_) => "Internal server error".to_string(),
            RefundError::Gateway(_) => "Payment gateway error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for refund operations
pub type RefundResult<T> = Result<T, RefundError>;
