//! Cancellation and refund data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::booking::ActorRole;
use crate::fare::Money;

/// Refund sub-state of a cancelled booking
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    None,
    Pending,
    Initiated,
    Completed,
}

impl RefundStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefundStatus::None => "none",
            RefundStatus::Pending => "pending",
            RefundStatus::Initiated => "initiated",
            RefundStatus::Completed => "completed",
        }
    }

    /// One-directional refund progression.
    ///
    /// `none -> completed` covers cancellations with nothing to refund.
    pub fn can_advance_to(&self, next: RefundStatus) -> bool {
        matches!(
            (self, next),
            (RefundStatus::None, RefundStatus::Pending)
                | (RefundStatus::None, RefundStatus::Completed)
                | (RefundStatus::Pending, RefundStatus::Initiated)
                | (RefundStatus::Initiated, RefundStatus::Completed)
        )
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(RefundStatus::None),
            "pending" => Ok(RefundStatus::Pending),
            "initiated" => Ok(RefundStatus::Initiated),
            "completed" => Ok(RefundStatus::Completed),
            other => Err(format!("unknown refund status: {other}")),
        }
    }
}

/// How money goes back to the rider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundMethod {
    Gateway,
    Manual,
}

impl fmt::Display for RefundMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefundMethod::Gateway => write!(f, "gateway"),
            RefundMethod::Manual => write!(f, "manual"),
        }
    }
}

/// Cancellation record embedded in a booking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cancellation {
    pub cancelled_by: i64,
    pub cancelled_by_role: ActorRole,
    pub cancelled_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub refund_amount: Money,
    pub refund_status: RefundStatus,
    pub refund_method: Option<RefundMethod>,
    pub refund_reference: Option<String>,
    pub refund_initiated_at: Option<DateTime<Utc>>,
    pub refund_completed_at: Option<DateTime<Utc>>,
    /// Penalty debited from the driver for this cancellation
    pub driver_penalty: Money,
}
