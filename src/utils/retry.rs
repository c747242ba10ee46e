// src/utils/retry.rs

//! Bounded retry helper.

use std::fmt;
use std::thread;
use std::time::Duration;

/// Retry settings for one operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::ZERO,
        }
    }
}

/// Failure after every attempt was used.
#[derive(Debug)]
pub struct Exhausted<E> {
    pub attempts: u32,
    pub last: E,
}

impl<E: fmt::Display> fmt::Display for Exhausted<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gave up after {} attempts: {}", self.attempts, self.last)
    }
}

impl RetryPolicy {
    /// Run `op` until it succeeds or the attempts run out.
    ///
    /// `op` receives the 1-based attempt number.
    pub fn run<T, E, F>(&self, mut op: F) -> Result<T, Exhausted<E>>
    where
        E: fmt::Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts => {
                    return Err(Exhausted {
                        attempts: attempt,
                        last: e,
                    });
                }
                Err(e) => {
                    log::warn!("Attempt {attempt}/{max_attempts} failed, retrying: {e}");
                    if !self.backoff.is_zero() {
                        thread::sleep(self.backoff);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flaky(failures: u32) -> impl FnMut(u32) -> Result<&'static str, String> {
        let mut calls = 0;
        move |_| {
            calls += 1;
            if calls <= failures {
                Err(format!("connection reset #{calls}"))
            } else {
                Ok("body")
            }
        }
    }

    #[test]
    fn test_success_on_first_attempt() {
        let result = RetryPolicy::default().run(flaky(0));
        assert_eq!(result.unwrap(), "body");
    }

    #[test]
    fn test_two_failures_then_success_is_transparent() {
        let mut seen = Vec::new();
        let mut op = flaky(2);
        let result = RetryPolicy::default().run(|attempt| {
            seen.push(attempt);
            op(attempt)
        });
        assert_eq!(result.unwrap(), "body");
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_three_failures_exhaust() {
        let err = RetryPolicy::default().run(flaky(3)).unwrap_err();
        assert_eq!(err.attempts, 3);
        assert_eq!(err.last, "connection reset #3");
        assert!(err.to_string().starts_with("gave up after 3 attempts"));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff: Duration::ZERO,
        };
        let err = policy.run(flaky(5)).unwrap_err();
        assert_eq!(err.attempts, 1);
    }
}
