//! In-process `Store` implementation.
//!
//! A single mutex guards all records, so every trait call is atomic with respect
//! to every other. Checks run before any mutation, which gives the same
//! all-or-nothing behaviour as a database transaction. Used by the test suites
//! and for local runs without PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::store::{Store, StoreError, StoreResult, TransitionCommit, VehicleChange};
use crate::booking::{Booking, BookingNumber, BookingStatus, Payment};
use crate::fare::Money;
use crate::ledger::{
    EntryDirection, LedgerEntry, LedgerPosting, Wallet, Withdrawal, WithdrawalStatus,
};
use crate::refund::{Cancellation, RefundStatus};
use crate::vehicle::{
    ApprovalStatus, DriverId, NewVehicle, Vehicle, VehicleId, VehicleSlot, VehicleStats,
    VehicleStatus,
};

#[derive(Default)]
struct MemoryState {
    vehicles: HashMap<VehicleId, Vehicle>,
    bookings: HashMap<BookingNumber, Booking>,
    wallets: HashMap<DriverId, Wallet>,
    entries: Vec<LedgerEntry>,
    withdrawals: Vec<Withdrawal>,
    next_vehicle_id: VehicleId,
    next_entry_id: i64,
    next_withdrawal_id: i64,
}

impl MemoryState {
    fn vehicle(&self, vehicle_id: VehicleId) -> StoreResult<&Vehicle> {
        self.vehicles
            .get(&vehicle_id)
            .ok_or(StoreError::VehicleNotFound(vehicle_id))
    }

    fn vehicle_mut(&mut self, vehicle_id: VehicleId) -> StoreResult<&mut Vehicle> {
        self.vehicles
            .get_mut(&vehicle_id)
            .ok_or(StoreError::VehicleNotFound(vehicle_id))
    }

    fn balance(&self, driver_id: DriverId) -> Money {
        self.wallets.get(&driver_id).map_or(0, |w| w.balance)
    }

    fn check_vehicle_change(&self, change: &VehicleChange) -> StoreResult<()> {
        match change {
            VehicleChange::Reserve { vehicle_id, .. } => {
                if !self.vehicle(*vehicle_id)?.can_reserve() {
                    return Err(StoreError::VehicleUnavailable(*vehicle_id));
                }
            }
            VehicleChange::StartTrip {
                vehicle_id,
                booking,
            } => {
                let vehicle = self.vehicle(*vehicle_id)?;
                if !matches!(vehicle.status, VehicleStatus::Booked | VehicleStatus::InTrip)
                    || vehicle.current_booking.as_ref() != Some(booking)
                {
                    return Err(StoreError::VehicleUnavailable(*vehicle_id));
                }
            }
            VehicleChange::Release { vehicle_id, .. } => {
                self.vehicle(*vehicle_id)?;
            }
        }
        Ok(())
    }

    /// Mirrors the one-active-booking-per-vehicle index of the SQL schema
    fn check_single_active(&self, booking: &Booking) -> StoreResult<()> {
        if !booking.status.holds_vehicle() {
            return Ok(());
        }
        let taken = self.bookings.values().any(|other| {
            other.vehicle_id == booking.vehicle_id
                && other.number != booking.number
                && other.status.holds_vehicle()
        });
        if taken {
            return Err(StoreError::VehicleUnavailable(booking.vehicle_id));
        }
        Ok(())
    }

    fn apply_vehicle_change(&mut self, change: &VehicleChange) -> StoreResult<()> {
        let now = Utc::now();
        match change {
            VehicleChange::Reserve {
                vehicle_id,
                booking,
            } => {
                let vehicle = self.vehicle_mut(*vehicle_id)?;
                vehicle.status = VehicleStatus::Booked;
                vehicle.current_booking = Some(booking.clone());
                vehicle.updated_at = now;
            }
            VehicleChange::StartTrip { vehicle_id, .. } => {
                let vehicle = self.vehicle_mut(*vehicle_id)?;
                vehicle.status = VehicleStatus::InTrip;
                vehicle.updated_at = now;
            }
            VehicleChange::Release {
                vehicle_id,
                booking,
                trip,
            } => {
                let vehicle = self.vehicle_mut(*vehicle_id)?;
                if vehicle.current_booking.as_ref() == Some(booking) {
                    vehicle.status = VehicleStatus::Available;
                    vehicle.current_booking = None;
                }
                if let Some(trip) = trip {
                    vehicle.stats.total_trips += 1;
                    vehicle.stats.total_distance_km += trip.distance_km;
                    vehicle.stats.total_earnings += trip.earnings;
                }
                vehicle.updated_at = now;
            }
        }
        Ok(())
    }

    /// Simulate postings in order; reject the batch if any debit overdraws
    fn check_postings(&self, postings: &[LedgerPosting]) -> StoreResult<()> {
        let mut balances: HashMap<DriverId, Money> = HashMap::new();
        for posting in postings {
            let balance = balances
                .entry(posting.driver_id)
                .or_insert_with(|| self.balance(posting.driver_id));
            if posting.direction == EntryDirection::Debit && *balance < posting.amount {
                return Err(StoreError::InsufficientBalance {
                    driver_id: posting.driver_id,
                    available: *balance,
                    required: posting.amount,
                });
            }
            *balance += posting.signed_amount();
        }
        Ok(())
    }

    fn apply_posting(&mut self, posting: &LedgerPosting) -> LedgerEntry {
        let now = Utc::now();
        let wallet = self
            .wallets
            .entry(posting.driver_id)
            .or_insert_with(|| Wallet {
                driver_id: posting.driver_id,
                balance: 0,
                updated_at: now,
            });
        wallet.balance += posting.signed_amount();
        wallet.updated_at = now;
        let balance_after = wallet.balance;

        self.next_entry_id += 1;
        let entry = LedgerEntry {
            id: self.next_entry_id,
            driver_id: posting.driver_id,
            direction: posting.direction,
            kind: posting.kind,
            amount: posting.amount,
            balance_after,
            description: posting.description.clone(),
            booking: posting.booking.clone(),
            created_at: now,
        };
        self.entries.push(entry.clone());
        entry
    }
}

/// Mutex-guarded in-memory store
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Corrupt("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_vehicle(&self, new: &NewVehicle) -> StoreResult<Vehicle> {
        let mut state = self.lock()?;
        if state
            .vehicles
            .values()
            .any(|v| v.registration_number == new.registration_number)
        {
            return Err(StoreError::Duplicate(new.registration_number.clone()));
        }

        state.next_vehicle_id += 1;
        let now = Utc::now();
        let vehicle = Vehicle {
            id: state.next_vehicle_id,
            registration_number: new.registration_number.clone(),
            driver_id: new.driver_id,
            category: new.category,
            pricing: new.pricing.clone(),
            status: VehicleStatus::Available,
            current_booking: None,
            approval: ApprovalStatus::Pending,
            is_active: true,
            is_verified: false,
            stats: VehicleStats::default(),
            created_at: now,
            updated_at: now,
        };
        state.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn get_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Option<Vehicle>> {
        Ok(self.lock()?.vehicles.get(&vehicle_id).cloned())
    }

    async fn set_vehicle_approval(
        &self,
        vehicle_id: VehicleId,
        approval: ApprovalStatus,
    ) -> StoreResult<Vehicle> {
        let mut state = self.lock()?;
        let vehicle = state.vehicle_mut(vehicle_id)?;
        vehicle.approval = approval;
        vehicle.is_verified = approval == ApprovalStatus::Approved;
        vehicle.updated_at = Utc::now();
        Ok(vehicle.clone())
    }

    async fn reserve_vehicle(
        &self,
        vehicle_id: VehicleId,
        booking: &BookingNumber,
    ) -> StoreResult<bool> {
        let mut state = self.lock()?;
        let change = VehicleChange::Reserve {
            vehicle_id,
            booking: booking.clone(),
        };
        match state.check_vehicle_change(&change) {
            Ok(()) => {
                state.apply_vehicle_change(&change)?;
                Ok(true)
            }
            Err(StoreError::VehicleUnavailable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn release_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<()> {
        let mut state = self.lock()?;
        let vehicle = state.vehicle_mut(vehicle_id)?;
        vehicle.status = VehicleStatus::Available;
        vehicle.current_booking = None;
        vehicle.updated_at = Utc::now();
        Ok(())
    }

    async fn swap_vehicle_slot(
        &self,
        vehicle_id: VehicleId,
        expected: &VehicleSlot,
        next: &VehicleSlot,
    ) -> StoreResult<bool> {
        let mut state = self.lock()?;
        let vehicle = state.vehicle_mut(vehicle_id)?;
        if vehicle.slot() != *expected {
            return Ok(false);
        }
        vehicle.status = next.status;
        vehicle.current_booking = next.current_booking.clone();
        vehicle.updated_at = Utc::now();
        Ok(true)
    }

    async fn insert_booking(&self, booking: &Booking) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.bookings.contains_key(&booking.number) {
            return Err(StoreError::Duplicate(booking.number.to_string()));
        }
        state.bookings.insert(booking.number.clone(), booking.clone());
        Ok(())
    }

    async fn get_booking(&self, number: &BookingNumber) -> StoreResult<Option<Booking>> {
        Ok(self.lock()?.bookings.get(number).cloned())
    }

    async fn bookings_for_vehicle(&self, vehicle_id: VehicleId) -> StoreResult<Vec<Booking>> {
        let state = self.lock()?;
        let mut bookings: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn commit_transition(&self, commit: &TransitionCommit) -> StoreResult<()> {
        let mut state = self.lock()?;

        if let Some(change) = &commit.vehicle {
            state.check_vehicle_change(change)?;
        }

        let number = &commit.booking.number;
        let stored = state
            .bookings
            .get(number)
            .ok_or_else(|| StoreError::BookingNotFound(number.clone()))?;
        if stored.status != commit.expected_status {
            return Err(StoreError::StaleBooking {
                number: number.clone(),
                current: stored.status,
            });
        }
        if stored.payment.status != commit.expected_payment {
            return Err(StoreError::PaymentChanged(number.clone()));
        }
        let payment = stored.payment.clone();

        state.check_single_active(&commit.booking)?;
        state.check_postings(&commit.postings)?;

        // Nothing below can fail
        if let Some(change) = &commit.vehicle {
            state.apply_vehicle_change(change)?;
        }
        let mut next = commit.booking.clone();
        next.payment = payment;
        state.bookings.insert(number.clone(), next);
        for posting in &commit.postings {
            state.apply_posting(posting);
        }
        Ok(())
    }

    async fn mark_paid(&self, number: &BookingNumber, payment: &Payment) -> StoreResult<bool> {
        let mut state = self.lock()?;
        let booking = state
            .bookings
            .get_mut(number)
            .ok_or_else(|| StoreError::BookingNotFound(number.clone()))?;
        if booking.status == BookingStatus::Cancelled || booking.payment.is_captured() {
            return Ok(false);
        }
        booking.payment = payment.clone();
        booking.updated_at = Utc::now();
        Ok(true)
    }

    async fn swap_refund(
        &self,
        number: &BookingNumber,
        expected: RefundStatus,
        next: &Cancellation,
    ) -> StoreResult<bool> {
        let mut state = self.lock()?;
        let booking = state
            .bookings
            .get_mut(number)
            .ok_or_else(|| StoreError::BookingNotFound(number.clone()))?;
        let stored = booking.cancellation.as_ref().map(|c| c.refund_status);
        if stored != Some(expected) {
            return Ok(false);
        }
        booking.cancellation = Some(next.clone());
        booking.updated_at = Utc::now();
        Ok(true)
    }

    async fn get_wallet(&self, driver_id: DriverId) -> StoreResult<Wallet> {
        let state = self.lock()?;
        Ok(state.wallets.get(&driver_id).cloned().unwrap_or_else(|| Wallet {
            driver_id,
            balance: 0,
            updated_at: Utc::now(),
        }))
    }

    async fn post_entries(&self, postings: &[LedgerPosting]) -> StoreResult<Vec<LedgerEntry>> {
        let mut state = self.lock()?;
        state.check_postings(postings)?;
        Ok(postings.iter().map(|p| state.apply_posting(p)).collect())
    }

    async fn list_entries(&self, driver_id: DriverId, limit: i64) -> StoreResult<Vec<LedgerEntry>> {
        let state = self.lock()?;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(state
            .entries
            .iter()
            .rev()
            .filter(|e| e.driver_id == driver_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn request_withdrawal(&self, posting: &LedgerPosting) -> StoreResult<Withdrawal> {
        let mut state = self.lock()?;
        state.check_postings(std::slice::from_ref(posting))?;
        let entry = state.apply_posting(posting);

        state.next_withdrawal_id += 1;
        let withdrawal = Withdrawal {
            id: state.next_withdrawal_id,
            driver_id: posting.driver_id,
            amount: posting.amount,
            status: WithdrawalStatus::Pending,
            entry_id: entry.id,
            requested_at: entry.created_at,
        };
        state.withdrawals.push(withdrawal.clone());
        Ok(withdrawal)
    }

    async fn list_withdrawals(&self, driver_id: DriverId) -> StoreResult<Vec<Withdrawal>> {
        let state = self.lock()?;
        Ok(state
            .withdrawals
            .iter()
            .rev()
            .filter(|w| w.driver_id == driver_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.lock().map(|_| ())
    }
}
