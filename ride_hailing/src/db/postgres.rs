//! PostgreSQL `Store` implementation.
//!
//! Reservations, booking status changes, refund steps and guarded debits are all
//! single conditional `UPDATE ... WHERE <expected state>` statements. Multi-record
//! writes run in one transaction and roll back on the first failed condition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::str::FromStr;
use std::sync::Arc;

use super::store::{Store, StoreError, StoreResult, TransitionCommit, VehicleChange};
use super::timeouts::{DEFAULT_QUERY_TIMEOUT, DEFAULT_TRANSACTION_TIMEOUT, with_timeout};
use crate::booking::{
    Booking, BookingNumber, BookingStatus, Payment, StatusChange, TripDetails, TripExecution,
};
use crate::ledger::{EntryDirection, LedgerEntry, LedgerPosting, Wallet, Withdrawal};
use crate::refund::{Cancellation, RefundStatus};
use crate::vehicle::{
    ApprovalStatus, DriverId, NewVehicle, Vehicle, VehicleId, VehicleSlot, VehicleStats,
};

const VEHICLE_COLUMNS: &str = "id, registration_number, driver_id, category, pricing, booking_status, \
     current_booking, approval_status, is_active, is_verified, total_trips, total_distance_km, \
     total_earnings, created_at, updated_at";

const BOOKING_COLUMNS: &str = "booking_number, rider_id, driver_id, vehicle_id, trip, fare, status, \
     status_history, execution, cancellation, payment, created_at, updated_at";

const ENTRY_COLUMNS: &str =
    "id, driver_id, direction, kind, amount, balance_after, description, booking_number, created_at";

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    async fn commit_transition_tx(&self, commit: &TransitionCommit) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(change) = &commit.vehicle {
            apply_vehicle_change(&mut tx, change).await?;
        }

        let booking = &commit.booking;
        let updated = sqlx::query(
            r#"
            UPDATE bookings
            SET driver_id = $2, status = $3, status_history = $4, execution = $5,
                cancellation = $6, refund_status = $7, updated_at = $8
            WHERE booking_number = $1 AND status = $9 AND payment_status = $10
            "#,
        )
        .bind(booking.number.as_str())
        .bind(booking.driver_id)
        .bind(booking.status.as_str())
        .bind(Json(&booking.history))
        .bind(booking.execution.as_ref().map(Json))
        .bind(booking.cancellation.as_ref().map(Json))
        .bind(refund_status_of(booking).as_str())
        .bind(booking.updated_at)
        .bind(commit.expected_status.as_str())
        .bind(commit.expected_payment.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            // one_active_booking_per_vehicle backs up the reservation check
            if is_unique_violation(&e) {
                StoreError::VehicleUnavailable(booking.vehicle_id)
            } else {
                StoreError::Database(e)
            }
        })?;

        if updated.rows_affected() == 0 {
            let current = sqlx::query(
                "SELECT status, payment_status FROM bookings WHERE booking_number = $1",
            )
            .bind(booking.number.as_str())
            .fetch_optional(&mut *tx)
            .await?;
            let Some(row) = current else {
                return Err(StoreError::BookingNotFound(booking.number.clone()));
            };
            let status: BookingStatus = parse(row.try_get("status")?)?;
            return Err(if status == commit.expected_status {
                StoreError::PaymentChanged(booking.number.clone())
            } else {
                StoreError::StaleBooking {
                    number: booking.number.clone(),
                    current: status,
                }
            });
        }

        for posting in &commit.postings {
            apply_posting(&mut tx, posting).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn vehicle_exists(&self, vehicle_id: VehicleId) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 FROM vehicles WHERE id = $1")
            .bind(vehicle_id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.is_some())
    }

    async fn booking_exists(&self, number: &BookingNumber) -> StoreResult<bool> {
        let row = sqlx::query("SELECT 1 FROM bookings WHERE booking_number = $1")
            .bind(number.as_str())
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(row.is_some())
    }

    async fn post_entries_tx(&self, postings: &[LedgerPosting]) -> StoreResult<Vec<LedgerEntry>> {
        let mut tx = self.pool.begin().await?;
        let mut entries = Vec::with_capacity(postings.len());
        for posting in postings {
            entries.push(apply_posting(&mut tx, posting).await?);
        }
        tx.commit().await?;
        Ok(entries)
    }

    async fn request_withdrawal_tx(&self, posting: &LedgerPosting) -> StoreResult<Withdrawal> {
        let mut tx = self.pool.begin().await?;
        let entry = apply_posting(&mut tx, posting).await?;

        let row = sqlx::query(
            r#"
            INSERT INTO withdrawals (driver_id, amount, status, entry_id)
            VALUES ($1, $2, 'pending', $3)
            RETURNING id, driver_id, amount, status, entry_id, requested_at
            "#,
        )
        .bind(posting.driver_id)
        .bind(posting.amount)
        .bind(entry.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        withdrawal_from_row(&row)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_vehicle(&self, new: &NewVehicle) -> StoreResult<Vehicle> {
        let sql = format!(
            r#"
            INSERT INTO vehicles (registration_number, driver_id, category, pricing)
            VALUES ($1, $2, $3, $4)
            RETURNING {VEHICLE_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(&new.registration_number)
            .bind(new.driver_id)
            .bind(new.category.as_str())
            .bind(Json(&new.pricing))
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Duplicate(new.registration_number.clone())
                } else {
                    StoreError::Database(e)
                }
            })?;
        vehicle_from_row(&row)
    }

    async fn get_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Option<Vehicle>> {
        let sql = format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1");
        let row = with_timeout(DEFAULT_QUERY_TIMEOUT, async {
            Ok(sqlx::query(&sql)
                .bind(vehicle_id)
                .fetch_optional(self.pool.as_ref())
                .await?)
        })
        .await?;
        row.as_ref().map(vehicle_from_row).transpose()
    }

    async fn set_vehicle_approval(
        &self,
        vehicle_id: VehicleId,
        approval: ApprovalStatus,
    ) -> StoreResult<Vehicle> {
        let sql = format!(
            r#"
            UPDATE vehicles
            SET approval_status = $2, is_verified = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {VEHICLE_COLUMNS}
            "#
        );
        let row = sqlx::query(&sql)
            .bind(vehicle_id)
            .bind(approval.as_str())
            .bind(approval == ApprovalStatus::Approved)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(StoreError::VehicleNotFound(vehicle_id))?;
        vehicle_from_row(&row)
    }

    async fn reserve_vehicle(
        &self,
        vehicle_id: VehicleId,
        booking: &BookingNumber,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;
        let change = VehicleChange::Reserve {
            vehicle_id,
            booking: booking.clone(),
        };
        match apply_vehicle_change(&mut tx, &change).await {
            Ok(()) => {
                tx.commit().await?;
                Ok(true)
            }
            Err(StoreError::VehicleUnavailable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn release_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET booking_status = 'available', current_booking = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(vehicle_id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::VehicleNotFound(vehicle_id));
        }
        Ok(())
    }

    async fn swap_vehicle_slot(
        &self,
        vehicle_id: VehicleId,
        expected: &VehicleSlot,
        next: &VehicleSlot,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET booking_status = $2, current_booking = $3, updated_at = NOW()
            WHERE id = $1 AND booking_status = $4 AND current_booking IS NOT DISTINCT FROM $5
            "#,
        )
        .bind(vehicle_id)
        .bind(next.status.as_str())
        .bind(next.current_booking.as_ref().map(BookingNumber::as_str))
        .bind(expected.status.as_str())
        .bind(expected.current_booking.as_ref().map(BookingNumber::as_str))
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.vehicle_exists(vehicle_id).await? {
            Ok(false)
        } else {
            Err(StoreError::VehicleNotFound(vehicle_id))
        }
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (booking_number, rider_id, driver_id, vehicle_id, trip, fare,
                                  status, status_history, execution, cancellation, refund_status,
                                  payment, payment_status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(booking.number.as_str())
        .bind(booking.rider_id)
        .bind(booking.driver_id)
        .bind(booking.vehicle_id)
        .bind(Json(&booking.trip))
        .bind(booking.fare)
        .bind(booking.status.as_str())
        .bind(Json(&booking.history))
        .bind(booking.execution.as_ref().map(Json))
        .bind(booking.cancellation.as_ref().map(Json))
        .bind(refund_status_of(booking).as_str())
        .bind(Json(&booking.payment))
        .bind(booking.payment.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Duplicate(booking.number.to_string())
            } else {
                StoreError::Database(e)
            }
        })?;
        Ok(())
    }

    async fn get_booking(&self, number: &BookingNumber) -> StoreResult<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_number = $1");
        let row = with_timeout(DEFAULT_QUERY_TIMEOUT, async {
            Ok(sqlx::query(&sql)
                .bind(number.as_str())
                .fetch_optional(self.pool.as_ref())
                .await?)
        })
        .await?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn bookings_for_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Vec<Booking>> {
        let sql = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE vehicle_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(vehicle_id)
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> StoreResult<()> {
        with_timeout(
            DEFAULT_TRANSACTION_TIMEOUT,
            self.commit_transition_tx(commit),
        )
        .await
    }

    async fn mark_paid(&self, number: &BookingNumber, payment: &Payment) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment = $2, payment_status = $3, updated_at = NOW()
            WHERE booking_number = $1 AND status <> 'cancelled' AND payment_status <> 'paid'
            "#,
        )
        .bind(number.as_str())
        .bind(Json(payment))
        .bind(payment.status.as_str())
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.booking_exists(number).await? {
            Ok(false)
        } else {
            Err(StoreError::BookingNotFound(number.clone()))
        }
    }

    async fn swap_refund(
        &self,
        number: &BookingNumber,
        expected: RefundStatus,
        next: &Cancellation,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET cancellation = $2, refund_status = $3, updated_at = NOW()
            WHERE booking_number = $1 AND refund_status = $4 AND cancellation IS NOT NULL
            "#,
        )
        .bind(number.as_str())
        .bind(Json(next))
        .bind(next.refund_status.as_str())
        .bind(expected.as_str())
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }
        if self.booking_exists(number).await? {
            Ok(false)
        } else {
            Err(StoreError::BookingNotFound(number.clone()))
        }
    }

    async fn get_wallet(&self, driver_id: DriverId) -> StoreResult<Wallet> {
        let row = sqlx::query("SELECT driver_id, balance, updated_at FROM wallets WHERE driver_id = $1")
            .bind(driver_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        match row {
            Some(row) => Ok(Wallet {
                driver_id: row.try_get("driver_id")?,
                balance: row.try_get("balance")?,
                updated_at: row.try_get("updated_at")?,
            }),
            None => Ok(Wallet {
                driver_id,
                balance: 0,
                updated_at: Utc::now(),
            }),
        }
    }

    async fn post_entries(&self, postings: &[LedgerPosting]) -> StoreResult<Vec<LedgerEntry>> {
        with_timeout(DEFAULT_TRANSACTION_TIMEOUT, self.post_entries_tx(postings)).await
    }

    async fn list_entries(&self, driver_id: DriverId, limit: i64) -> StoreResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM wallet_entries WHERE driver_id = $1 ORDER BY id DESC LIMIT $2"
        );
        let rows = sqlx::query(&sql)
            .bind(driver_id)
            .bind(limit)
            .fetch_all(self.pool.as_ref())
            .await?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn request_withdrawal(&self, posting: &LedgerPosting) -> StoreResult<Withdrawal> {
        with_timeout(
            DEFAULT_TRANSACTION_TIMEOUT,
            self.request_withdrawal_tx(posting),
        )
        .await
    }

    async fn list_withdrawals(&self, driver_id: DriverId) -> StoreResult<Vec<Withdrawal>> {
        let rows = sqlx::query(
            r#"
            SELECT id, driver_id, amount, status, entry_id, requested_at
            FROM withdrawals
            WHERE driver_id = $1
            ORDER BY id DESC
            "#,
        )
        .bind(driver_id)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.iter().map(withdrawal_from_row).collect()
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

/// Conditional vehicle update inside a transaction
async fn apply_vehicle_change(
    tx: &mut Transaction<'_, Postgres>,
    change: &VehicleChange,
) -> StoreResult<()> {
    match change {
        VehicleChange::Reserve {
            vehicle_id,
            booking,
        } => {
            // Single compare-and-set; concurrent reservations serialize on the row lock
            let result = sqlx::query(
                r#"
                UPDATE vehicles
                SET booking_status = 'booked', current_booking = $2, updated_at = NOW()
                WHERE id = $1
                  AND booking_status = 'available'
                  AND is_active AND is_verified
                  AND approval_status = 'approved'
                "#,
            )
            .bind(vehicle_id)
            .bind(booking.as_str())
            .execute(&mut **tx)
            .await?;
            ensure_vehicle_matched(tx, *vehicle_id, result.rows_affected()).await
        }
        VehicleChange::StartTrip {
            vehicle_id,
            booking,
        } => {
            let result = sqlx::query(
                r#"
                UPDATE vehicles
                SET booking_status = 'in_trip', updated_at = NOW()
                WHERE id = $1 AND booking_status IN ('booked', 'in_trip') AND current_booking = $2
                "#,
            )
            .bind(vehicle_id)
            .bind(booking.as_str())
            .execute(&mut **tx)
            .await?;
            ensure_vehicle_matched(tx, *vehicle_id, result.rows_affected()).await
        }
        VehicleChange::Release {
            vehicle_id,
            booking,
            trip,
        } => {
            sqlx::query(
                r#"
                UPDATE vehicles
                SET booking_status = 'available', current_booking = NULL, updated_at = NOW()
                WHERE id = $1 AND current_booking = $2
                "#,
            )
            .bind(vehicle_id)
            .bind(booking.as_str())
            .execute(&mut **tx)
            .await?;

            if let Some(trip) = trip {
                let result = sqlx::query(
                    r#"
                    UPDATE vehicles
                    SET total_trips = total_trips + 1,
                        total_distance_km = total_distance_km + $2,
                        total_earnings = total_earnings + $3,
                        updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(vehicle_id)
                .bind(trip.distance_km)
                .bind(trip.earnings)
                .execute(&mut **tx)
                .await?;
                if result.rows_affected() == 0 {
                    return Err(StoreError::VehicleNotFound(*vehicle_id));
                }
            }
            Ok(())
        }
    }
}

async fn ensure_vehicle_matched(
    tx: &mut Transaction<'_, Postgres>,
    vehicle_id: VehicleId,
    rows_affected: u64,
) -> StoreResult<()> {
    if rows_affected == 1 {
        return Ok(());
    }
    let exists = sqlx::query("SELECT 1 FROM vehicles WHERE id = $1")
        .bind(vehicle_id)
        .fetch_optional(&mut **tx)
        .await?
        .is_some();
    if exists {
        Err(StoreError::VehicleUnavailable(vehicle_id))
    } else {
        Err(StoreError::VehicleNotFound(vehicle_id))
    }
}

/// Write one ledger entry, updating the cached wallet balance in the same transaction
async fn apply_posting(
    tx: &mut Transaction<'_, Postgres>,
    posting: &LedgerPosting,
) -> StoreResult<LedgerEntry> {
    sqlx::query("INSERT INTO wallets (driver_id, balance) VALUES ($1, 0) ON CONFLICT (driver_id) DO NOTHING")
        .bind(posting.driver_id)
        .execute(&mut **tx)
        .await?;

    let balance_after: i64 = match posting.direction {
        EntryDirection::Credit => sqlx::query(
            "UPDATE wallets
             SET balance = balance + $2, updated_at = NOW()
             WHERE driver_id = $1
             RETURNING balance",
        )
        .bind(posting.driver_id)
        .bind(posting.amount)
        .fetch_one(&mut **tx)
        .await?
        .try_get("balance")?,
        EntryDirection::Debit => {
            // Atomically debit with balance check
            let row = sqlx::query(
                "UPDATE wallets
                 SET balance = balance - $2, updated_at = NOW()
                 WHERE driver_id = $1 AND balance >= $2
                 RETURNING balance",
            )
            .bind(posting.driver_id)
            .bind(posting.amount)
            .fetch_optional(&mut **tx)
            .await?;

            match row {
                Some(row) => row.try_get("balance")?,
                None => {
                    let available: i64 =
                        sqlx::query("SELECT balance FROM wallets WHERE driver_id = $1")
                            .bind(posting.driver_id)
                            .fetch_one(&mut **tx)
                            .await?
                            .try_get("balance")?;
                    return Err(StoreError::InsufficientBalance {
                        driver_id: posting.driver_id,
                        available,
                        required: posting.amount,
                    });
                }
            }
        }
    };

    let sql = format!(
        r#"
        INSERT INTO wallet_entries (driver_id, direction, kind, amount, balance_after, description, booking_number)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {ENTRY_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(posting.driver_id)
        .bind(posting.direction.as_str())
        .bind(posting.kind.as_str())
        .bind(posting.amount)
        .bind(balance_after)
        .bind(&posting.description)
        .bind(posting.booking.as_ref().map(BookingNumber::as_str))
        .fetch_one(&mut **tx)
        .await?;
    entry_from_row(&row)
}

fn refund_status_of(booking: &Booking) -> RefundStatus {
    booking
        .cancellation
        .as_ref()
        .map_or(RefundStatus::None, |c| c.refund_status)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

fn parse<T>(value: String) -> StoreResult<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(StoreError::Corrupt)
}

fn vehicle_from_row(row: &PgRow) -> StoreResult<Vehicle> {
    Ok(Vehicle {
        id: row.try_get("id")?,
        registration_number: row.try_get("registration_number")?,
        driver_id: row.try_get("driver_id")?,
        category: parse(row.try_get("category")?)?,
        pricing: row.try_get::<Json<_>, _>("pricing")?.0,
        status: parse(row.try_get("booking_status")?)?,
        current_booking: row
            .try_get::<Option<String>, _>("current_booking")?
            .map(BookingNumber::new),
        approval: parse(row.try_get("approval_status")?)?,
        is_active: row.try_get("is_active")?,
        is_verified: row.try_get("is_verified")?,
        stats: VehicleStats {
            total_trips: row.try_get("total_trips")?,
            total_distance_km: row.try_get("total_distance_km")?,
            total_earnings: row.try_get("total_earnings")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn booking_from_row(row: &PgRow) -> StoreResult<Booking> {
    Ok(Booking {
        number: BookingNumber::new(row.try_get::<String, _>("booking_number")?),
        rider_id: row.try_get("rider_id")?,
        driver_id: row.try_get("driver_id")?,
        vehicle_id: row.try_get("vehicle_id")?,
        trip: row.try_get::<Json<TripDetails>, _>("trip")?.0,
        fare: row.try_get("fare")?,
        status: parse::<BookingStatus>(row.try_get("status")?)?,
        history: row.try_get::<Json<Vec<StatusChange>>, _>("status_history")?.0,
        execution: row
            .try_get::<Option<Json<TripExecution>>, _>("execution")?
            .map(|json| json.0),
        cancellation: row
            .try_get::<Option<Json<Cancellation>>, _>("cancellation")?
            .map(|json| json.0),
        payment: row.try_get::<Json<Payment>, _>("payment")?.0,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn entry_from_row(row: &PgRow) -> StoreResult<LedgerEntry> {
    Ok(LedgerEntry {
        id: row.try_get("id")?,
        driver_id: row.try_get("driver_id")?,
        direction: parse(row.try_get("direction")?)?,
        kind: parse(row.try_get("kind")?)?,
        amount: row.try_get("amount")?,
        balance_after: row.try_get("balance_after")?,
        description: row.try_get("description")?,
        booking: row
            .try_get::<Option<String>, _>("booking_number")?
            .map(BookingNumber::new),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn withdrawal_from_row(row: &PgRow) -> StoreResult<Withdrawal> {
    Ok(Withdrawal {
        id: row.try_get("id")?,
        driver_id: row.try_get("driver_id")?,
        amount: row.try_get("amount")?,
        status: parse(row.try_get("status")?)?,
        entry_id: row.try_get("entry_id")?,
        requested_at: row.try_get("requested_at")?,
    })
}
