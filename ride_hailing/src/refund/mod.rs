//! Cancellation and refund workflow.
//!
//! A cancel transition produces a `Cancellation` record with a refund sub-state.
//! The refund then only moves forward: `none -> pending -> initiated -> completed`
//! (or straight to `completed` when nothing is owed).

pub mod errors;
pub mod models;
pub mod workflow;

pub use errors::{RefundError, RefundResult};
pub use models::{Cancellation, RefundMethod, RefundStatus};
pub use workflow::{RefundManager, plan_cancellation};
