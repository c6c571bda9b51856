//! In-process payment gateway for local runs and tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{
    CaptureStatus, GatewayError, GatewayResult, PaymentGateway, RefundReceipt, RefundRequest,
};

#[derive(Debug, Default)]
struct GatewayState {
    payments: HashMap<String, CaptureStatus>,
    refunds: HashMap<String, (RefundRequest, RefundReceipt)>,
}

/// Gateway that keeps payments in memory.
///
/// Refunds are keyed by idempotency key, so repeating a request returns the
/// first receipt instead of refunding again.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    state: Mutex<GatewayState>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payment with the given status
    pub fn set_payment(&self, reference: &str, status: CaptureStatus) {
        if let Ok(mut state) = self.state.lock() {
            state.payments.insert(reference.to_string(), status);
        }
    }

    /// Register a captured payment
    pub fn capture(&self, reference: &str) {
        self.set_payment(reference, CaptureStatus::Captured);
    }

    /// Refund requests accepted so far
    pub fn refunds(&self) -> Vec<RefundRequest> {
        self.state
            .lock()
            .map(|state| state.refunds.values().map(|(req, _)| req.clone()).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> GatewayResult<std::sync::MutexGuard<'_, GatewayState>> {
        self.state
            .lock()
            .map_err(|_| GatewayError::InvalidResponse("gateway state poisoned".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for InMemoryGateway {
    async fn capture_status(&self, payment_reference: &str) -> GatewayResult<CaptureStatus> {
        self.lock()?
            .payments
            .get(payment_reference)
            .copied()
            .ok_or_else(|| GatewayError::UnknownPayment(payment_reference.to_string()))
    }

    async fn refund(&self, request: &RefundRequest) -> GatewayResult<RefundReceipt> {
        let mut state = self.lock()?;

        if let Some((_, receipt)) = state.refunds.get(&request.idempotency_key) {
            return Ok(receipt.clone());
        }

        match state.payments.get(&request.payment_reference) {
            Some(CaptureStatus::Captured) => {}
            Some(status) => {
                return Err(GatewayError::Rejected {
                    status: 400,
                    message: format!("payment is {status}, not captured"),
                });
            }
            None => return Err(GatewayError::UnknownPayment(request.payment_reference.clone())),
        }

        let receipt = RefundReceipt {
            reference: format!("rfnd_{}", state.refunds.len() + 1),
            status: "processed".to_string(),
        };
        state
            .refunds
            .insert(request.idempotency_key.clone(), (request.clone(), receipt.clone()));
        Ok(receipt)
    }
}
