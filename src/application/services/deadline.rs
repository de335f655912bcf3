//! Time bound for store calls.

use std::future::Future;
use std::time::Duration;

use serde_json::json;
use tracing::warn;

use crate::error::AppError;

/// Default upper bound on a single store call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Awaits a store call, failing with [`AppError::Unavailable`] once `limit` elapses.
pub async fn bounded<T, F>(limit: Duration, op: &'static str, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!(op, timeout_ms = limit.as_millis() as u64, "Store call timed out");
            Err(AppError::unavailable(
                "Storage did not respond in time",
                json!({ "operation": op }),
            ))
        }
    }
}
