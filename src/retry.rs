//! Retry mechanisms for remote fetches.
//!
//! This module provides bounded, blocking retry with:
//! - A fixed pause between attempts
//! - Conditional retry based on the error's transient classification
//! - Max retry limits counted as *additional* attempts after the first
//!
//! # Example
//!
//! ```rust,ignore
//! use conifer::retry::RetryPolicy;
//! use std::time::Duration;
//!
//! // One initial attempt plus two retries, three seconds apart.
//! let policy = RetryPolicy::constant(2, Duration::from_secs(3));
//!
//! let body = policy.execute(|attempt| transport.get(&url))?;
//! ```

use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Represents the outcome of a retry decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Should retry the operation.
    Retry,
    /// Should not retry - give up.
    GiveUp,
}

/// Helper trait for transient error classification.
pub trait TransientError {
    /// Returns true if this error is transient and should be retried.
    fn is_transient(&self) -> bool;
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 means no retries, just the initial attempt).
    pub max_retries: u32,

    /// Pause between consecutive attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::constant(1, Duration::from_secs(3))
    }
}

impl RetryPolicy {
    /// Create a policy with `max_retries` extra attempts, `delay` apart.
    pub fn constant(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Check if retrying should continue based on attempt count.
    pub fn should_continue(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Run `operation` until it succeeds, a non-transient error occurs, or
    /// the attempts are used up. Blocks the calling thread between attempts.
    ///
    /// `operation` receives the 1-based attempt number.
    pub fn execute<F, T, E>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
        E: TransientError + fmt::Display,
    {
        self.execute_with(operation, |error: &E, _attempt| {
            if error.is_transient() {
                RetryDecision::Retry
            } else {
                RetryDecision::GiveUp
            }
        })
    }

    /// Like [`RetryPolicy::execute`] with a caller-supplied retry condition.
    pub fn execute_with<F, C, T, E>(&self, mut operation: F, condition: C) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Result<T, E>,
        C: Fn(&E, u32) -> RetryDecision,
        E: fmt::Display,
    {
        let mut attempt = 0;

        loop {
            debug!("Attempt {} of {}", attempt + 1, self.max_attempts());

            match operation(attempt + 1) {
                Ok(result) => {
                    if attempt > 0 {
                        debug!("Operation succeeded after {} retry attempts", attempt);
                    }
                    return Ok(result);
                }
                Err(e) => {
                    if condition(&e, attempt) == RetryDecision::GiveUp {
                        return Err(RetryError::Aborted {
                            attempts: attempt + 1,
                            error: e,
                        });
                    }

                    warn!("Attempt {} failed: {}", attempt + 1, e);

                    if !self.should_continue(attempt) {
                        return Err(RetryError::MaxRetriesExceeded {
                            attempts: attempt + 1,
                            last_error: e,
                        });
                    }

                    warn!("Will try again in {:?}", self.delay);
                    if !self.delay.is_zero() {
                        std::thread::sleep(self.delay);
                    }

                    attempt += 1;
                }
            }
        }
    }
}

/// Error type for retry operations.
#[derive(Debug)]
pub enum RetryError<E> {
    /// Maximum number of retries exceeded.
    MaxRetriesExceeded {
        /// Number of attempts made.
        attempts: u32,
        /// The last error encountered.
        last_error: E,
    },
    /// The retry condition refused to retry this error.
    Aborted {
        /// Number of attempts made.
        attempts: u32,
        /// The error that stopped the loop.
        error: E,
    },
}

impl<E> RetryError<E> {
    /// Number of attempts made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::MaxRetriesExceeded { attempts, .. } | RetryError::Aborted { attempts, .. } => {
                *attempts
            }
        }
    }

    /// Consume the error, returning the last underlying error.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::MaxRetriesExceeded { last_error, .. } => last_error,
            RetryError::Aborted { error, .. } => error,
        }
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryError::MaxRetriesExceeded {
                attempts,
                last_error,
            } => write!(
                f,
                "Max retries exceeded after {} attempts. Last error: {}",
                attempts, last_error
            ),
            RetryError::Aborted { attempts, error } => {
                write!(f, "Gave up after {} attempts: {}", attempts, error)
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RetryError::MaxRetriesExceeded { last_error, .. } => Some(last_error),
            RetryError::Aborted { error, .. } => Some(error),
        }
    }
}
