//! Ledger data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::booking::BookingNumber;
use crate::fare::Money;
use crate::vehicle::DriverId;

/// Driver wallet (cached balance over the entry log)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    pub driver_id: DriverId,
    pub balance: Money,
    pub updated_at: DateTime<Utc>,
}

/// Entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Credit,
    Debit,
}

impl EntryDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryDirection::Credit => "credit",
            EntryDirection::Debit => "debit",
        }
    }
}

impl fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(EntryDirection::Credit),
            "debit" => Ok(EntryDirection::Debit),
            other => Err(format!("unknown entry direction: {other}")),
        }
    }
}

/// What an entry is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    TripEarning,
    Withdrawal,
    Penalty,
    Adjustment,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::TripEarning => "trip_earning",
            EntryKind::Withdrawal => "withdrawal",
            EntryKind::Penalty => "penalty",
            EntryKind::Adjustment => "adjustment",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trip_earning" => Ok(EntryKind::TripEarning),
            "withdrawal" => Ok(EntryKind::Withdrawal),
            "penalty" => Ok(EntryKind::Penalty),
            "adjustment" => Ok(EntryKind::Adjustment),
            other => Err(format!("unknown entry kind: {other}")),
        }
    }
}

/// Immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub driver_id: DriverId,
    pub direction: EntryDirection,
    pub kind: EntryKind,
    /// Always positive; `direction` carries the sign
    pub amount: Money,
    pub balance_after: Money,
    pub description: String,
    pub booking: Option<BookingNumber>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn signed_amount(&self) -> Money {
        match self.direction {
            EntryDirection::Credit => self.amount,
            EntryDirection::Debit => -self.amount,
        }
    }
}

/// A ledger entry that has not been written yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerPosting {
    pub driver_id: DriverId,
    pub direction: EntryDirection,
    pub kind: EntryKind,
    pub amount: Money,
    pub description: String,
    pub booking: Option<BookingNumber>,
}

impl LedgerPosting {
    pub fn credit(
        driver_id: DriverId,
        kind: EntryKind,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        Self {
            driver_id,
            direction: EntryDirection::Credit,
            kind,
            amount,
            description: description.into(),
            booking: None,
        }
    }

    pub fn debit(
        driver_id: DriverId,
        kind: EntryKind,
        amount: Money,
        description: impl Into<String>,
    ) -> Self {
        Self {
            driver_id,
            direction: EntryDirection::Debit,
            kind,
            amount,
            description: description.into(),
            booking: None,
        }
    }

    pub fn for_booking(mut self, booking: &BookingNumber) -> Self {
        self.booking = Some(booking.clone());
        self
    }

    pub fn signed_amount(&self) -> Money {
        match self.direction {
            EntryDirection::Credit => self.amount,
            EntryDirection::Debit => -self.amount,
        }
    }
}

/// Withdrawal approval status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Approved,
    Rejected,
}

impl WithdrawalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Approved => "approved",
            WithdrawalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for WithdrawalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(WithdrawalStatus::Pending),
            "approved" => Ok(WithdrawalStatus::Approved),
            "rejected" => Ok(WithdrawalStatus::Rejected),
            other => Err(format!("unknown withdrawal status: {other}")),
        }
    }
}

/// Withdrawal request. Funds are debited when the request is queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub driver_id: DriverId,
    pub amount: Money,
    pub status: WithdrawalStatus,
    pub entry_id: i64,
    pub requested_at: DateTime<Utc>,
}
