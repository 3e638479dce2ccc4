/*!
 * Cooperative cancellation and request pacing.
 *
 * The pipeline runs on a single task. Cancellation is a shared flag checked
 * between iterations; backend calls are paced with a fixed delay.
 */

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::errors::AppError;

/// Shared cancellation flag, cheap to clone
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    cancelled: Arc<AtomicBool>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail with `AppError::Cancelled` once cancellation was requested
    pub fn check(&self) -> Result<(), AppError> {
        if self.is_cancelled() {
            Err(AppError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Fixed delay applied after every backend request
#[derive(Debug, Clone, Copy)]
pub struct RequestThrottle {
    delay: Duration,
}

impl RequestThrottle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep the configured delay
    pub async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        debug!("Waiting {} ms before the next request", self.delay.as_millis());
        tokio::time::sleep(self.delay).await;
    }
}
