//! Collaborator seams: payment gateway and status-change notifications.
//!
//! The booking core never calls these inside a transition commit. Payment capture is
//! checked before a booking is marked paid, refunds are issued before the refund
//! sub-state advances, and notifications are sent after the commit has landed.

pub mod memory;
pub mod notifier;
pub mod razorpay;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::booking::BookingNumber;
use crate::fare::Money;

pub use memory::InMemoryGateway;
pub use notifier::{BookingEvent, LogNotifier, Notifier, NotifyError};
pub use razorpay::{HttpPaymentGateway, RazorpayConfig};

/// Payment state as reported by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureStatus {
    Created,
    Authorized,
    Captured,
    Refunded,
    Failed,
}

impl CaptureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureStatus::Created => "created",
            CaptureStatus::Authorized => "authorized",
            CaptureStatus::Captured => "captured",
            CaptureStatus::Refunded => "refunded",
            CaptureStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for CaptureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Refund instruction sent to the gateway
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundRequest {
    pub booking: BookingNumber,
    pub payment_reference: String,
    pub amount: Money,
    /// Repeating a request with the same key must not refund twice
    pub idempotency_key: String,
}

impl RefundRequest {
    pub fn for_booking(booking: &BookingNumber, payment_reference: &str, amount: Money) -> Self {
        Self {
            booking: booking.clone(),
            payment_reference: payment_reference.to_string(),
            amount,
            idempotency_key: format!("refund-{booking}"),
        }
    }
}

/// Gateway acknowledgement of a refund
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefundReceipt {
    pub reference: String,
    pub status: String,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Unknown payment: {0}")]
    UnknownPayment(String),

    #[error("Unexpected gateway response: {0}")]
    InvalidResponse(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Payment provider operations consumed by the booking core
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Current state of a payment
    async fn capture_status(&self, payment_reference: &str) -> GatewayResult<CaptureStatus>;

    /// Refund part or all of a captured payment
    async fn refund(&self, request: &RefundRequest) -> GatewayResult<RefundReceipt>;
}
