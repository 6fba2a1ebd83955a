//! Per-item retry/fallback policy.
//!
//! A detail fetch walks an explicit state machine:
//!
//! ```text
//! Attempting ──ok──────────────────────────────▶ Resolved
//!     │ transient            │ permanent
//!     ▼                      │
//! Retrying(n) ──ok──▶ Resolved
//!     │ exhausted / permanent │
//!     ▼                       ▼
//! FallingBack ──ok──▶ Resolved
//!     │ err
//!     ▼
//! Dropped
//! ```
//!
//! [`RetryPolicy::run`] covers `Attempting`/`Retrying`; the fallback step is
//! driven by the detail cache because only it knows the source locator.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use super::CatalogError;
use crate::config::HydrationConfig;
use crate::metrics::UPSTREAM_RETRIES;

/// Upper bound on a single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Where a single item's resolution ended up (or is).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    Attempting,
    /// Retry number `n` (1-based) is in flight.
    Retrying(u32),
    FallingBack,
    Resolved,
    Dropped,
}

impl RetryState {
    /// Primary-fetch state once `retries` retries have been made.
    pub fn after_retries(retries: u32) -> Self {
        match retries {
            0 => RetryState::Attempting,
            n => RetryState::Retrying(n),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RetryState::Attempting => "attempting",
            RetryState::Retrying(_) => "retrying",
            RetryState::FallingBack => "falling_back",
            RetryState::Resolved => "resolved",
            RetryState::Dropped => "dropped",
        }
    }
}

/// Exponential backoff for transient upstream failures.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Additional attempts after the first one.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(500),
            multiplier: 2.0,
        }
    }
}

impl From<&HydrationConfig> for RetryPolicy {
    fn from(config: &HydrationConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            multiplier: config.backoff_multiplier,
        }
    }
}

impl RetryPolicy {
    /// No retries and no waiting. Handy for tests.
    pub fn immediate() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    /// Delay before retry number `retry` (1-based), capped at [`MAX_BACKOFF`].
    pub fn backoff(&self, retry: u32) -> Duration {
        if self.initial_backoff.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .map(|delay| delay.min(MAX_BACKOFF))
            .unwrap_or(MAX_BACKOFF)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    ///
    /// Only transient errors are retried. The last error is returned as is.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, CatalogError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CatalogError>>,
    {
        // Retries done so far
        let mut retries: u32 = 0;
        loop {
            let err = match op().await {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !err.is_transient() || retries >= self.max_retries {
                let state = RetryState::after_retries(retries);
                debug!(what, state = state.as_str(), error = %err, "Giving up on primary fetch");
                return Err(err);
            }

            retries += 1;
            let delay = self.backoff(retries);
            debug!(what, retry = retries, delay_ms = delay.as_millis() as u64, error = %err, "Retrying");
            UPSTREAM_RETRIES.inc();
            sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> CatalogError {
        CatalogError::ApiError {
            status: 503,
            message: "busy".to_string(),
        }
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_backoff: Duration::from_millis(1),
            multiplier: 2.0,
        }
    }

    #[test]
    fn test_backoff_is_exponential() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(500),
            multiplier: 1e20,
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), MAX_BACKOFF);
        assert_eq!(policy.backoff(u32::MAX), MAX_BACKOFF);
    }

    #[test]
    fn test_backoff_survives_non_finite_multiplier() {
        for multiplier in [f64::INFINITY, f64::NAN] {
            let policy = RetryPolicy {
                max_retries: 2,
                initial_backoff: Duration::from_millis(10),
                multiplier,
            };
            assert_eq!(policy.backoff(2), MAX_BACKOFF);
        }
        let immediate = RetryPolicy {
            multiplier: f64::INFINITY,
            ..RetryPolicy::immediate()
        };
        assert_eq!(immediate.backoff(3), Duration::ZERO);
    }

    #[test]
    fn test_state_after_retries() {
        assert_eq!(RetryState::after_retries(0), RetryState::Attempting);
        assert_eq!(RetryState::after_retries(2), RetryState::Retrying(2));
    }

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from(&HydrationConfig::default());
        assert_eq!(policy, RetryPolicy::default());
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(2)
            .run("pokemon 1", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(server_error())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy(2)
            .run("pokemon 1", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(server_error()) }
            })
            .await;

        assert!(matches!(result, Err(CatalogError::ApiError { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast_policy(2)
            .run("pokemon 1", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CatalogError::NotFound("pokemon 1".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(CatalogError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
