//! Utility functions and helpers.

pub mod html;
pub mod http;

use std::time::Duration;

use async_trait::async_trait;

/// Suspends the current task for a fixed duration.
///
/// Backoff waits and inter-item pauses go through this seam so tests can
/// record them instead of sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
