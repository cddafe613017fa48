//! Fixed-interval polling for checks that need the environment to converge.
//!
//! One primitive serves every eventually-consistent check: the attempt
//! closure returns `Ok(value)` when the condition holds and `Err(_)` for
//! anything that should be tried again, whether a connection failure or an
//! assertion that has not yet become true.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{CheckError, CheckResult};

/// Bounded retry schedule: fixed attempt cap, fixed sleep between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollPolicy {
    /// Retries after the first attempt (0 = run once).
    pub max_retries: u32,
    /// Sleep between attempts.
    pub delay: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_retries: 20,
            delay: Duration::from_secs(5),
        }
    }
}

impl PollPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Total number of attempts, counting the first one.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Run `attempt` until it succeeds or the policy's attempt cap is reached.
///
/// No sleep follows the final attempt. On exhaustion the last error is
/// folded into [`CheckError::RetriesExhausted`].
pub async fn poll_until<T, F, Fut>(
    policy: &PollPolicy,
    description: &str,
    mut attempt: F,
) -> CheckResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CheckResult<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut last_error = String::new();

    for n in 1..=max_attempts {
        match attempt().await {
            Ok(value) => {
                debug!(description, attempt = n, "poll condition met");
                return Ok(value);
            }
            Err(err) => {
                warn!(description, attempt = n, max_attempts, error = %err, "poll attempt failed");
                last_error = err.to_string();
            }
        }

        if n < max_attempts {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Err(CheckError::RetriesExhausted {
        description: description.to_string(),
        attempts: max_attempts,
        last_error,
    })
}
