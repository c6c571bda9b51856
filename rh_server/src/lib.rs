//! HTTP surface for the ride-hailing booking core.
//!
//! The binary in `main.rs` wires configuration, logging and metrics around
//! [`api::create_router`]; tests drive the same router in-process.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
