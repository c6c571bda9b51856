//! Storage operation timeout helpers
//!
//! Wraps store futures so a stuck transaction surfaces as an error instead of
//! holding a request worker forever.

use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::store::{StoreError, StoreResult};

/// Default timeout for single queries (5 seconds)
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default timeout for multi-statement transactions (10 seconds)
pub const DEFAULT_TRANSACTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Execute a storage operation with a timeout
pub async fn with_timeout<F, T>(duration: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match timeout(duration, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(duration)),
    }
}
