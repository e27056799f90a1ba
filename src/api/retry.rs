/// Bounded retry with exponential backoff for idempotent reads.
///
/// Only transient failures are retried: transport errors, `429` and `5xx`.
/// Writes never go through this path.
use std::time::Duration;

use crate::error::{Error, Result};

/// Upper bound on a single backoff delay.
const MAX_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// A single attempt, no retries.
    #[cfg(test)]
    fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    /// Run `op` until it succeeds, fails permanently, or retries run out.
    /// Returns the final result and the number of attempts made.
    pub fn run<T>(&self, mut op: impl FnMut() -> Result<T>) -> (Result<T>, u32) {
        let mut attempts = 0;
        loop {
            attempts += 1;
            let result = op();
            match &result {
                Err(e) if is_transient(e) && attempts <= self.max_retries => {
                    std::thread::sleep(self.delay_for(attempts - 1));
                }
                _ => return (result, attempts),
            }
        }
    }
}

pub(crate) fn is_transient(error: &Error) -> bool {
    match error {
        Error::Network(_) => true,
        Error::Http { status, .. } => *status == 429 || *status >= 500,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(250));
        assert_eq!(policy.delay_for(0), Duration::from_millis(250));
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(6), MAX_DELAY);
        assert_eq!(policy.delay_for(40), MAX_DELAY);
    }

    #[test]
    fn retries_transient_failures_until_success() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let mut calls = 0;
        let (result, attempts) = policy.run(|| {
            calls += 1;
            if calls < 3 {
                Err(Error::Network("connection reset".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts, 3);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let policy = RetryPolicy::new(1, Duration::ZERO);
        let (result, attempts) = policy.run(|| -> Result<()> {
            Err(Error::Http {
                status: 503,
                message: None,
            })
        });
        assert_eq!(result.unwrap_err().status(), Some(503));
        assert_eq!(attempts, 2);
    }

    #[test]
    fn client_errors_are_not_retried() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let (result, attempts) = policy.run(|| -> Result<()> {
            Err(Error::Http {
                status: 404,
                message: None,
            })
        });
        assert!(result.is_err());
        assert_eq!(attempts, 1);

        let (_, attempts) =
            policy.run(|| -> Result<()> { Err(Error::Decode("bad".to_string())) });
        assert_eq!(attempts, 1);
    }

    #[test]
    fn none_makes_a_single_attempt() {
        let (_, attempts) = RetryPolicy::none()
            .run(|| -> Result<()> { Err(Error::Network("down".to_string())) });
        assert_eq!(attempts, 1);
    }
}
