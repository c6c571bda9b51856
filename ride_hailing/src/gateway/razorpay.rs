//! HTTP client for a Razorpay-style payments API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{
    CaptureStatus, GatewayError, GatewayResult, PaymentGateway, RefundReceipt, RefundRequest,
};
use crate::config::{ConfigError, parse_env_or};
use crate::fare::Money;

pub const RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";

/// Credentials and endpoint for the HTTP gateway
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub base_url: String,
    pub key_id: String,
    pub key_secret: String,
    pub timeout_secs: u64,
}

impl RazorpayConfig {
    /// Read `RAZORPAY_KEY_ID`, `RAZORPAY_KEY_SECRET`, `RAZORPAY_BASE_URL` and
    /// `RAZORPAY_TIMEOUT_SECS`. Returns `Ok(None)` when no key id is configured.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        let Ok(key_id) = std::env::var("RAZORPAY_KEY_ID") else {
            return Ok(None);
        };

        let key_secret =
            std::env::var("RAZORPAY_KEY_SECRET").map_err(|_| ConfigError::MissingRequired {
                var: "RAZORPAY_KEY_SECRET".to_string(),
                hint: "Required when RAZORPAY_KEY_ID is set".to_string(),
            })?;

        Ok(Some(Self {
            base_url: std::env::var("RAZORPAY_BASE_URL")
                .unwrap_or_else(|_| RAZORPAY_API_URL.to_string()),
            key_id,
            key_secret,
            timeout_secs: parse_env_or("RAZORPAY_TIMEOUT_SECS", 10)?,
        }))
    }
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    status: String,
}

#[derive(Debug, Serialize)]
struct RefundBody<'a> {
    /// Smallest currency unit (paise)
    amount: i64,
    receipt: &'a str,
    notes: RefundNotes<'a>,
}

#[derive(Debug, Serialize)]
struct RefundNotes<'a> {
    booking_number: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefundResponse {
    id: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    description: String,
}

/// Payment gateway over HTTPS with basic auth
#[derive(Debug, Clone)]
pub struct HttpPaymentGateway {
    config: RazorpayConfig,
    http_client: Client,
}

impl HttpPaymentGateway {
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client cannot be built.
    pub fn new(config: RazorpayConfig) -> GatewayResult<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            config,
            http_client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn rejection(response: reqwest::Response) -> GatewayError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope.error.description,
            Err(_) => "no error description".to_string(),
        };
        GatewayError::Rejected { status, message }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn capture_status(&self, payment_reference: &str) -> GatewayResult<CaptureStatus> {
        let response = self
            .http_client
            .get(self.url(&format!("payments/{payment_reference}")))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::UnknownPayment(payment_reference.to_string()));
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let payment: PaymentResponse = response.json().await?;
        parse_capture_status(&payment.status)
    }

    async fn refund(&self, request: &RefundRequest) -> GatewayResult<RefundReceipt> {
        let body = RefundBody {
            amount: to_subunits(request.amount),
            receipt: &request.idempotency_key,
            notes: RefundNotes {
                booking_number: request.booking.as_str(),
            },
        };

        log::debug!(
            "Requesting gateway refund of {} for booking {}",
            request.amount,
            request.booking
        );

        let response = self
            .http_client
            .post(self.url(&format!("payments/{}/refund", request.payment_reference)))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .header("Idempotency-Key", &request.idempotency_key)
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GatewayError::UnknownPayment(request.payment_reference.clone()));
        }
        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let refund: RefundResponse = response.json().await?;
        Ok(RefundReceipt {
            reference: refund.id,
            status: refund.status,
        })
    }
}

fn to_subunits(amount: Money) -> i64 {
    amount.saturating_mul(100)
}

fn parse_capture_status(raw: &str) -> GatewayResult<CaptureStatus> {
    match raw {
        "created" => Ok(CaptureStatus::Created),
        "authorized" => Ok(CaptureStatus::Authorized),
        "captured" => Ok(CaptureStatus::Captured),
        "refunded" => Ok(CaptureStatus::Refunded),
        "failed" => Ok(CaptureStatus::Failed),
        other => Err(GatewayError::InvalidResponse(format!(
            "unknown payment status {other:?}"
        ))),
    }
}
