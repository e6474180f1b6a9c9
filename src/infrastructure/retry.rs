//! Bounded retry with exponential backoff for transient remote failures

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::{GitError, RegistryError};

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

impl Retryable for RegistryError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            RegistryError::LoginFailed { .. }
                | RegistryError::PushFailed { .. }
                | RegistryError::ManifestFailed { .. }
        )
    }
}

impl Retryable for GitError {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            GitError::RemoteUnavailable { .. } | GitError::PushFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_secs(2),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting
    pub fn none() -> Self {
        Self {
            attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based), doubling up to the cap
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails permanently, or attempts run out.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        E: Retryable + Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        "{} attempt {}/{} failed: {} (retrying in {})",
                        label,
                        attempt,
                        attempts,
                        e,
                        humantime::format_duration(delay)
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
