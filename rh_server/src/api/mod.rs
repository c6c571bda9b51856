//! HTTP API for the booking engine.
//!
//! # Modules
//!
//! - [`bookings`]: booking creation, transitions, payment and refunds
//! - [`vehicles`]: registration, review, availability and fare quotes
//! - [`wallets`]: driver wallet, entries, withdrawals and penalties
//! - [`middleware`]: actor identity headers and role guards
//!
//! # Endpoints
//!
//! ```text
//! GET  /health
//! POST /api/v1/bookings
//! GET  /api/v1/bookings/{number}
//! POST /api/v1/bookings/{number}/transition
//! POST /api/v1/bookings/{number}/payment
//! POST /api/v1/bookings/{number}/refund/initiate      (admin)
//! POST /api/v1/bookings/{number}/refund/complete      (admin)
//! POST /api/v1/vehicles
//! GET  /api/v1/vehicles/{id}
//! GET  /api/v1/vehicles/{id}/bookings
//! POST /api/v1/vehicles/{id}/review                   (admin)
//! POST /api/v1/vehicles/{id}/availability
//! POST /api/v1/vehicles/{id}/release                  (admin)
//! GET  /api/v1/vehicles/{id}/quote
//! GET  /api/v1/wallet
//! GET  /api/v1/wallet/entries
//! GET  /api/v1/wallet/withdrawals
//! POST /api/v1/wallet/withdrawals
//! POST /api/v1/drivers/{id}/penalties                 (admin)
//! ```
//!
//! Every `/api/v1` route requires the `x-actor-id` / `x-actor-role` headers.

pub mod bookings;
pub mod error;
pub mod middleware;
pub mod request_id;
pub mod vehicles;
pub mod wallets;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use ride_hailing::{
    BookingManager, EngineConfig, Ledger, RefundManager, Store, VehicleTracker,
    gateway::{Notifier, PaymentGateway},
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every manager is a handle over the same store.
#[derive(Clone)]
pub struct AppState {
    pub tracker: VehicleTracker,
    pub bookings: BookingManager,
    pub refunds: RefundManager,
    pub ledger: Ledger,
    pub store: Arc<dyn Store>,
}

impl AppState {
    /// Wire every manager over one store and one gateway
    pub fn new(
        store: Arc<dyn Store>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        engine: EngineConfig,
    ) -> Self {
        Self {
            tracker: VehicleTracker::new(store.clone()),
            ledger: Ledger::new(store.clone(), engine.min_withdrawal_amount),
            refunds: RefundManager::new(store.clone(), gateway.clone()),
            bookings: BookingManager::new(store.clone(), gateway, notifier, engine),
            store,
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use rh_server::api::{create_router, AppState};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let state: AppState = unimplemented!();
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(bookings::create_booking))
        .route("/bookings/{number}", get(bookings::get_booking))
        .route("/bookings/{number}/transition", post(bookings::transition))
        .route("/bookings/{number}/payment", post(bookings::record_payment))
        .route(
            "/bookings/{number}/refund/initiate",
            post(bookings::initiate_refund),
        )
        .route(
            "/bookings/{number}/refund/complete",
            post(bookings::complete_refund),
        )
        .route("/vehicles", post(vehicles::register_vehicle))
        .route("/vehicles/{id}", get(vehicles::get_vehicle))
        .route("/vehicles/{id}/bookings", get(bookings::list_for_vehicle))
        .route("/vehicles/{id}/review", post(vehicles::review_vehicle))
        .route(
            "/vehicles/{id}/availability",
            post(vehicles::set_availability),
        )
        .route("/vehicles/{id}/release", post(vehicles::release_vehicle))
        .route("/vehicles/{id}/quote", get(vehicles::quote_fare))
        .route("/wallet", get(wallets::get_wallet))
        .route("/wallet/entries", get(wallets::list_entries))
        .route(
            "/wallet/withdrawals",
            get(wallets::list_withdrawals).post(wallets::request_withdrawal),
        )
        .route("/drivers/{id}/penalties", post(wallets::apply_penalty))
        .layer(axum::middleware::from_fn(middleware::actor_middleware))
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` if the store answers, or `503 Service Unavailable`.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = match state.store.health_check().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("Store health check failed: {e}");
            false
        }
    };

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
