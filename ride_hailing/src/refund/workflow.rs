//! Cancellation planning and the refund sub-state machine.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::{
    errors::{RefundError, RefundResult},
    models::{Cancellation, RefundMethod, RefundStatus},
};
use crate::booking::{Actor, Booking, BookingNumber, TransitionPayload};
use crate::db::Store;
use crate::gateway::{PaymentGateway, RefundRequest};

/// Build the cancellation record for `booking`.
///
/// Unpaid bookings owe nothing and close their refund immediately. Paid bookings
/// owe the fare, less an admin-supplied deduction (never below zero).
pub fn plan_cancellation(
    booking: &Booking,
    actor: &Actor,
    payload: &TransitionPayload,
    now: DateTime<Utc>,
) -> Cancellation {
    let refund_amount = if booking.payment.is_captured() {
        let deduction = match payload.refund_deduction {
            Some(deduction) if actor.is_admin() => deduction.max(0),
            Some(_) => {
                log::warn!(
                    "Ignoring refund deduction from {} {} on {}",
                    actor.role,
                    actor.id,
                    booking.number
                );
                0
            }
            None => 0,
        };
        (booking.fare - deduction).max(0)
    } else {
        0
    };

    let refund_status = if refund_amount == 0 {
        RefundStatus::Completed
    } else {
        RefundStatus::Pending
    };

    Cancellation {
        cancelled_by: actor.id,
        cancelled_by_role: actor.role,
        cancelled_at: now,
        reason: payload.reason.clone(),
        refund_amount,
        refund_status,
        refund_method: None,
        refund_reference: None,
        refund_initiated_at: None,
        refund_completed_at: (refund_status == RefundStatus::Completed).then_some(now),
        driver_penalty: 0,
    }
}

/// Drives refunds of cancelled bookings: `pending -> initiated -> completed`
#[derive(Clone)]
pub struct RefundManager {
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
}

impl RefundManager {
    pub fn new(store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { store, gateway }
    }

    /// Start returning money to the rider.
    ///
    /// With `RefundMethod::Gateway` the gateway is called first, keyed by the
    /// booking number, so a retry after a crash does not refund twice.
    ///
    /// # Errors
    ///
    /// * `RefundError::NotCancelled` - Booking is not cancelled
    /// * `RefundError::AlreadyRefunded` - Refund already completed
    /// * `RefundError::InvalidTransition` - Refund is not `pending`
    /// * `RefundError::MissingPaymentReference` - Gateway refund without a captured payment
    pub async fn initiate_refund(
        &self,
        number: &BookingNumber,
        method: RefundMethod,
        reference: Option<String>,
    ) -> RefundResult<Booking> {
        let booking = self.load(number).await?;
        let current = cancellation_of(&booking)?;
        ensure_step(&booking.number, current.refund_status, RefundStatus::Initiated)?;

        let mut next = current.clone();
        next.refund_reference = match method {
            RefundMethod::Gateway => {
                let payment_reference = booking
                    .payment
                    .reference
                    .as_deref()
                    .ok_or_else(|| RefundError::MissingPaymentReference(number.clone()))?;
                let request =
                    RefundRequest::for_booking(number, payment_reference, current.refund_amount);
                let receipt = self.gateway.refund(&request).await?;
                Some(receipt.reference)
            }
            RefundMethod::Manual => reference,
        };
        next.refund_status = RefundStatus::Initiated;
        next.refund_method = Some(method);
        next.refund_initiated_at = Some(Utc::now());

        self.advance(number, current.refund_status, &next).await
    }

    /// Record that the rider has the money back
    ///
    /// # Errors
    ///
    /// * `RefundError::AlreadyRefunded` - Refund already completed; nothing changes
    /// * `RefundError::InvalidTransition` - Refund was never initiated
    pub async fn complete_refund(&self, number: &BookingNumber) -> RefundResult<Booking> {
        let booking = self.load(number).await?;
        let current = cancellation_of(&booking)?;
        ensure_step(&booking.number, current.refund_status, RefundStatus::Completed)?;

        let mut next = current.clone();
        next.refund_status = RefundStatus::Completed;
        next.refund_completed_at = Some(Utc::now());

        self.advance(number, current.refund_status, &next).await
    }

    async fn advance(
        &self,
        number: &BookingNumber,
        expected: RefundStatus,
        next: &Cancellation,
    ) -> RefundResult<Booking> {
        if self.store.swap_refund(number, expected, next).await? {
            log::info!(
                "Refund for {} {} -> {} ({})",
                number,
                expected,
                next.refund_status,
                next.refund_amount
            );
            return self.load(number).await;
        }

        // Lost to a concurrent step; report against what is stored now
        let booking = self.load(number).await?;
        let current = cancellation_of(&booking)?;
        ensure_step(number, current.refund_status, next.refund_status)?;
        Err(RefundError::InvalidTransition {
            from: current.refund_status,
            to: next.refund_status,
        })
    }

    async fn load(&self, number: &BookingNumber) -> RefundResult<Booking> {
        self.store
            .get_booking(number)
            .await?
            .ok_or_else(|| RefundError::NotFound(number.clone()))
    }
}

fn cancellation_of(booking: &Booking) -> RefundResult<&Cancellation> {
    booking
        .cancellation
        .as_ref()
        .ok_or_else(|| RefundError::NotCancelled {
            number: booking.number.clone(),
            status: booking.status,
        })
}

fn ensure_step(number: &BookingNumber, from: RefundStatus, to: RefundStatus) -> RefundResult<()> {
    if from == RefundStatus::Completed {
        return Err(RefundError::AlreadyRefunded(number.clone()));
    }
    if !from.can_advance_to(to) {
        return Err(RefundError::InvalidTransition { from, to });
    }
    Ok(())
}
