//! Driver wallet API handlers.
//!
//! Drivers see their own wallet; an admin may pass `driver_id` to inspect any
//! wallet and is the only role that can apply penalties.

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use ride_hailing::{
    Money,
    booking::Actor,
    ledger::{DEFAULT_ENTRY_LIMIT, EntryKind, LedgerEntry, Wallet, Withdrawal},
    vehicle::DriverId,
};
use serde::Deserialize;

use super::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{require_admin, require_driver},
};
use crate::metrics;

#[derive(Debug, Default, Deserialize)]
pub struct WalletQuery {
    /// Admin only: whose wallet to read
    pub driver_id: Option<DriverId>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WithdrawalRequest {
    pub amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct PenaltyRequest {
    pub amount: Money,
    pub description: String,
}

/// Wallet owner addressed by the request
fn wallet_owner(actor: &Actor, query: &WalletQuery) -> ApiResult<DriverId> {
    match query.driver_id {
        Some(driver_id) if driver_id != actor.id => {
            require_admin(actor)?;
            Ok(driver_id)
        }
        _ if actor.is_admin() => Err(ApiError::new(
            "invalid_payload",
            "driver_id is required for admin wallet reads",
        )),
        _ => {
            require_driver(actor)?;
            Ok(actor.id)
        }
    }
}

pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<WalletQuery>,
) -> ApiResult<Json<Wallet>> {
    let driver_id = wallet_owner(&actor, &query)?;
    Ok(Json(state.ledger.wallet(driver_id).await?))
}

/// Most recent entries first; `limit` defaults to 50
pub async fn list_entries(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<WalletQuery>,
) -> ApiResult<Json<Vec<LedgerEntry>>> {
    let driver_id = wallet_owner(&actor, &query)?;
    let limit = query.limit.unwrap_or(DEFAULT_ENTRY_LIMIT);
    Ok(Json(state.ledger.entries(driver_id, limit).await?))
}

pub async fn list_withdrawals(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<WalletQuery>,
) -> ApiResult<Json<Vec<Withdrawal>>> {
    let driver_id = wallet_owner(&actor, &query)?;
    Ok(Json(state.ledger.withdrawals(driver_id).await?))
}

/// Request a payout of earned balance.
///
/// The amount is debited immediately and held until the payout is processed.
///
/// # Errors
///
/// - `402 Payment Required`: Amount exceeds the balance; nothing is written
/// - `422 Unprocessable Entity`: Amount below the configured minimum
pub async fn request_withdrawal(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(request): Json<WithdrawalRequest>,
) -> ApiResult<(StatusCode, Json<Withdrawal>)> {
    require_driver(&actor)?;
    let withdrawal = state
        .ledger
        .request_withdrawal(actor.id, request.amount)
        .await?;
    metrics::ledger_posting(EntryKind::Withdrawal.as_str());
    Ok((StatusCode::CREATED, Json(withdrawal)))
}

/// Debit a penalty from a driver's wallet (admin only)
pub async fn apply_penalty(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(driver_id): Path<DriverId>,
    Json(request): Json<PenaltyRequest>,
) -> ApiResult<(StatusCode, Json<LedgerEntry>)> {
    require_admin(&actor)?;
    let entry = state
        .ledger
        .apply_penalty(driver_id, request.amount, &request.description)
        .await?;
    metrics::ledger_posting(EntryKind::Penalty.as_str());
    tracing::info!(admin = actor.id, driver_id, amount = request.amount, "Penalty applied");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_reads_own_wallet() {
        let query = WalletQuery::default();
        assert_eq!(wallet_owner(&Actor::driver(4), &query).unwrap(), 4);
    }

    #[test]
    fn test_only_admin_reads_other_wallets() {
        let query = WalletQuery {
            driver_id: Some(9),
            limit: None,
        };
        assert!(wallet_owner(&Actor::driver(4), &query).is_err());
        assert_eq!(wallet_owner(&Actor::admin(1), &query).unwrap(), 9);
    }

    #[test]
    fn test_riders_have_no_wallet() {
        assert!(wallet_owner(&Actor::rider(4), &WalletQuery::default()).is_err());
    }

    #[test]
    fn test_admin_must_name_driver() {
        let err = wallet_owner(&Actor::admin(1), &WalletQuery::default()).unwrap_err();
        assert_eq!(err.kind(), "invalid_payload");
    }
}
