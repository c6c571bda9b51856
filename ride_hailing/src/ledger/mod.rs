//! Earnings ledger: per-driver wallets backed by an append-only entry log.
//!
//! The cached balance is maintained in the same atomic step as the entry that
//! changes it, so it always equals the signed sum of the driver's entries.
//! Debits (withdrawals, penalties) are guarded and never overdraw a wallet.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{LedgerError, LedgerResult};
pub use manager::{DEFAULT_ENTRY_LIMIT, Ledger};
pub use models::{
    EntryDirection, EntryKind, LedgerEntry, LedgerPosting, Wallet, Withdrawal, WithdrawalStatus,
};
