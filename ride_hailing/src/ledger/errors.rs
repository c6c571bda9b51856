//! Ledger error types.

use thiserror::Error;

use crate::db::StoreError;
use crate::fare::Money;
use crate::vehicle::DriverId;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Debit exceeds the current balance
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance {
        driver_id: DriverId,
        available: Money,
        required: Money,
    },

    /// Invalid amount (must be positive)
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    /// Withdrawal below the configured minimum
    #[error("Withdrawal of {amount} is below the minimum of {minimum}")]
    BelowMinimumWithdrawal { amount: Money, minimum: Money },

    /// Storage error
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientBalance {
                driver_id,
                available,
                required,
            } => LedgerError::InsufficientBalance {
                driver_id,
                available,
                required,
            },
            other => LedgerError::Store(other),
        }
    }
}

impl LedgerError {
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InsufficientBalance { .. } => "insufficient_balance",
            LedgerError::InvalidAmount(_) => "invalid_amount",
            LedgerError::BelowMinimumWithdrawal { .. } => "below_minimum_withdrawal",
            LedgerError::Store(_) => "internal",
        }
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            LedgerError::Store(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
