//! Ride-hailing booking server.
//!
//! Loads configuration, connects the store and payment gateway, and serves the
//! REST API until interrupted.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use log::info;
use pico_args::Arguments;
use ride_hailing::{
    MemoryStore, Store,
    db::Database,
    gateway::{HttpPaymentGateway, InMemoryGateway, LogNotifier, PaymentGateway},
};
use rh_server::{
    api,
    config::{Overrides, ServerConfig, StorageBackend},
    logging, metrics,
};

const HELP: &str = "\
Run the ride-hailing booking server

USAGE:
  rh_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --storage    BACKEND     memory | postgres           [default: env STORAGE_BACKEND or postgres]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                  Server bind address (e.g., 0.0.0.0:8080)
  STORAGE_BACKEND              memory or postgres
  DATABASE_URL                 PostgreSQL connection string
  METRICS_BIND                 Prometheus listener (e.g., 0.0.0.0:9090)
  RAZORPAY_KEY_ID              Payment gateway key; unset uses an in-memory gateway
  RAZORPAY_KEY_SECRET          Payment gateway secret
  MIN_WITHDRAWAL_AMOUNT        Smallest payout a driver may request
  DRIVER_CANCELLATION_PENALTY  Debit when a driver cancels an accepted booking
  FARE_RECOMPUTE_TOLERANCE     Distance drift that triggers a fare recompute
  (See .env file for all configuration options)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str::<_, SocketAddr>("--bind")?,
        database_url: pargs.opt_value_from_str("--db-url")?,
        storage: pargs.opt_value_from_str::<_, StorageBackend>("--storage")?,
    };

    logging::init();

    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    if let Some(addr) = config.metrics_addr {
        metrics::init_metrics(addr).map_err(anyhow::Error::msg)?;
        info!("Prometheus metrics listening on {addr}");
    }

    let store: Arc<dyn Store> = match (&config.storage, &config.database) {
        (StorageBackend::Postgres, Some(db_config)) => {
            info!("Connecting to database");
            let db = Database::new(db_config)
                .await
                .context("Failed to connect to database")?;
            info!("Database connected successfully");
            Arc::new(db.store())
        }
        _ => {
            log::warn!("Using in-memory storage; state is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let gateway: Arc<dyn PaymentGateway> = match config.razorpay.clone() {
        Some(razorpay) => Arc::new(
            HttpPaymentGateway::new(razorpay).context("Failed to build payment gateway client")?,
        ),
        None => {
            log::warn!("RAZORPAY_KEY_ID not set; payments are checked against an in-memory gateway");
            Arc::new(InMemoryGateway::new())
        }
    };

    let state = api::AppState::new(store, gateway, Arc::new(LogNotifier), config.engine.clone());
    let app = api::create_router(state);

    info!("Starting HTTP server on {}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
    }
}
