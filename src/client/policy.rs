use crate::client::config::ClientConfig;
use crate::Error;
use std::time::Duration;

/// What the dispatcher does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Retry rules for unary calls.
///
/// Only decoded API errors with a transient status are retried, with a fixed
/// pause between attempts. Streaming calls never go through this policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Re-sends allowed after the first attempt. `None` means no cap.
    pub max_retries: Option<u32>,
    /// Pause used when the request carries none of its own.
    pub default_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Some(3),
            default_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            default_delay: config.retry_delay,
        }
    }

    /// Retry transient failures forever.
    pub fn unbounded(default_delay: Duration) -> Self {
        Self {
            max_retries: None,
            default_delay,
        }
    }

    /// Never retry.
    pub fn disabled() -> Self {
        Self {
            max_retries: Some(0),
            default_delay: Duration::ZERO,
        }
    }

    /// `attempt` is 0-based: the first failure is attempt 0.
    pub fn decide(&self, err: &Error, attempt: u32, request_delay: Option<Duration>) -> Decision {
        if !err.is_transient() {
            return Decision::Fail;
        }
        if matches!(self.max_retries, Some(max) if attempt >= max) {
            return Decision::Fail;
        }
        Decision::Retry {
            delay: request_delay.unwrap_or(self.default_delay),
        }
    }
}
