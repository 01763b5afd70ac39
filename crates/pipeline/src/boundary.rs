//! Time budget for calls that leave the process.

use std::future::Future;
use std::time::Duration;
use taxgpt_core::{AppError, AppResult};

/// Run an external call, turning an overrun into [`AppError::Timeout`].
pub async fn bounded<T, F>(call: &str, limit: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} did not answer within {:?}",
            call, limit
        ))),
    }
}
