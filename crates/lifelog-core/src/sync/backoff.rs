//! Fixed delay before each external call.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Read-only pacing shared by every step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Backoff {
    pub delay: Duration,
}

impl Backoff {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// No pause at all; used by tests and local stores.
    pub fn none() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from_millis(350)
    }
}
