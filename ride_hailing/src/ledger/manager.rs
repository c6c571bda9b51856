//! Earnings ledger over the `Store` seam.

use std::sync::Arc;

use super::{
    errors::{LedgerError, LedgerResult},
    models::{EntryKind, LedgerEntry, LedgerPosting, Wallet, Withdrawal},
};
use crate::db::Store;
use crate::fare::Money;
use crate::vehicle::DriverId;

/// Default page size for entry listings
pub const DEFAULT_ENTRY_LIMIT: i64 = 50;

/// Driver wallets: credits, guarded debits, penalties and withdrawals
#[derive(Clone)]
pub struct Ledger {
    store: Arc<dyn Store>,
    min_withdrawal: Money,
}

impl Ledger {
    /// Create a ledger
    ///
    /// # Arguments
    ///
    /// * `store` - Persistence layer
    /// * `min_withdrawal` - Smallest amount a driver may withdraw
    pub fn new(store: Arc<dyn Store>, min_withdrawal: Money) -> Self {
        Self {
            store,
            min_withdrawal,
        }
    }

    pub fn min_withdrawal(&self) -> Money {
        self.min_withdrawal
    }

    /// Credit a driver wallet
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidAmount` - Amount is not positive
    pub async fn credit(
        &self,
        driver_id: DriverId,
        amount: Money,
        description: &str,
    ) -> LedgerResult<LedgerEntry> {
        self.post(LedgerPosting::credit(
            driver_id,
            EntryKind::Adjustment,
            amount,
            description,
        ))
        .await
    }

    /// Debit a driver wallet; never takes the balance below zero
    ///
    /// # Errors
    ///
    /// * `LedgerError::InvalidAmount` - Amount is not positive
    /// * `LedgerError::InsufficientBalance` - Amount exceeds the balance; nothing is written
    pub async fn debit(
        &self,
        driver_id: DriverId,
        amount: Money,
        description: &str,
    ) -> LedgerResult<LedgerEntry> {
        self.post(LedgerPosting::debit(
            driver_id,
            EntryKind::Adjustment,
            amount,
            description,
        ))
        .await
    }

    /// Admin penalty debit
    pub async fn apply_penalty(
        &self,
        driver_id: DriverId,
        amount: Money,
        description: &str,
    ) -> LedgerResult<LedgerEntry> {
        let entry = self
            .post(LedgerPosting::debit(
                driver_id,
                EntryKind::Penalty,
                amount,
                description,
            ))
            .await?;
        log::info!("Penalty of {amount} debited from driver {driver_id}");
        Ok(entry)
    }

    /// Escrow a withdrawal: the debit lands now, approval happens elsewhere
    ///
    /// # Errors
    ///
    /// * `LedgerError::BelowMinimumWithdrawal` - Amount under the configured minimum
    /// * `LedgerError::InsufficientBalance` - Amount exceeds the balance; nothing is written
    pub async fn request_withdrawal(
        &self,
        driver_id: DriverId,
        amount: Money,
    ) -> LedgerResult<Withdrawal> {
        if amount <= 0 {
            return Err(LedgerError::InvalidAmount(amount));
        }
        if amount < self.min_withdrawal {
            return Err(LedgerError::BelowMinimumWithdrawal {
                amount,
                minimum: self.min_withdrawal,
            });
        }

        let posting = LedgerPosting::debit(
            driver_id,
            EntryKind::Withdrawal,
            amount,
            "Withdrawal request",
        );
        let withdrawal = self.store.request_withdrawal(&posting).await?;

        log::info!(
            "Withdrawal {} of {} queued for driver {}",
            withdrawal.id,
            amount,
            driver_id
        );
        Ok(withdrawal)
    }

    pub async fn wallet(&self, driver_id: DriverId) -> LedgerResult<Wallet> {
        Ok(self.store.get_wallet(driver_id).await?)
    }

    /// Most recent entries first
    pub async fn entries(&self, driver_id: DriverId, limit: i64) -> LedgerResult<Vec<LedgerEntry>> {
        Ok(self.store.list_entries(driver_id, limit.clamp(1, 500)).await?)
    }

    pub async fn withdrawals(&self, driver_id: DriverId) -> LedgerResult<Vec<Withdrawal>> {
        Ok(self.store.list_withdrawals(driver_id).await?)
    }

    async fn post(&self, posting: LedgerPosting) -> LedgerResult<LedgerEntry> {
        if posting.amount <= 0 {
            return Err(LedgerError::InvalidAmount(posting.amount));
        }

        let mut entries = self.store.post_entries(std::slice::from_ref(&posting)).await?;
        let entry = entries.pop().ok_or_else(|| {
            LedgerError::Store(crate::db::StoreError::Corrupt(
                "posting returned no entry".to_string(),
            ))
        })?;

        log::debug!(
            "Ledger {} of {} for driver {} (balance {})",
            entry.direction,
            entry.amount,
            entry.driver_id,
            entry.balance_after
        );
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    fn ledger() -> Ledger {
        Ledger::new(Arc::new(MemoryStore::new()), 100)
    }

    #[tokio::test]
    async fn test_credit_then_debit() {
        let ledger = ledger();
        ledger.credit(7, 500, "Opening balance").await.unwrap();
        let entry = ledger.debit(7, 200, "Fuel advance").await.unwrap();

        assert_eq!(entry.balance_after, 300);
        assert_eq!(ledger.wallet(7).await.unwrap().balance, 300);
    }

    #[tokio::test]
    async fn test_debit_over_balance_is_rejected() {
        let ledger = ledger();
        ledger.credit(7, 50, "Opening balance").await.unwrap();

        let err = ledger.debit(7, 51, "Too much").await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                available: 50,
                required: 51,
                ..
            }
        ));
        assert_eq!(ledger.entries(7, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let ledger = ledger();
        assert!(matches!(
            ledger.credit(7, 0, "nothing").await,
            Err(LedgerError::InvalidAmount(0))
        ));
        assert!(matches!(
            ledger.apply_penalty(7, -10, "negative").await,
            Err(LedgerError::InvalidAmount(-10))
        ));
    }

    #[tokio::test]
    async fn test_withdrawal_minimum() {
        let ledger = ledger();
        ledger.credit(7, 1_000, "Opening balance").await.unwrap();

        let err = ledger.request_withdrawal(7, 99).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::BelowMinimumWithdrawal {
                amount: 99,
                minimum: 100
            }
        ));
    }

    #[tokio::test]
    async fn test_withdrawal_escrows_funds_immediately() {
        let ledger = ledger();
        ledger.credit(7, 1_000, "Opening balance").await.unwrap();

        let withdrawal = ledger.request_withdrawal(7, 400).await.unwrap();
        assert_eq!(withdrawal.amount, 400);
        assert_eq!(ledger.wallet(7).await.unwrap().balance, 600);
        assert_eq!(ledger.withdrawals(7).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_penalty_entry_kind() {
        let ledger = ledger();
        ledger.credit(7, 300, "Opening balance").await.unwrap();

        let entry = ledger.apply_penalty(7, 120, "Late arrival").await.unwrap();
        assert_eq!(entry.kind, EntryKind::Penalty);
        assert_eq!(entry.signed_amount(), -120);
    }
}
