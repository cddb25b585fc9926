// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Reconnect and health-check policies.
//!
//! This module provides the retry-delay policies used by the reconnect
//! loop, the pure backoff state they drive, and the period used by the
//! optional health-check thread.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default first retry delay.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(10);
/// Default retry delay ceiling.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(300);
/// Attempt budget of the escalating configuration.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Policy for spacing reconnect attempts.
pub trait RetryPolicy: Send + Sync + fmt::Debug {
    /// Delay to wait after the attempt numbered `attempt` (0-based).
    fn delay(&self, attempt: u32) -> Duration;

    /// Attempt budget, `None` for unbounded retries.
    fn max_attempts(&self) -> Option<u32>;

    /// Whether another attempt is allowed after `attempt` attempts.
    fn should_retry(&self, attempt: u32) -> bool {
        self.max_attempts().map_or(true, |max| attempt < max)
    }
}

/// Exponential backoff retry policy.
///
/// Delays double with each attempt, up to a configured maximum delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentialBackoff {
    base_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<u32>,
}

impl ExponentialBackoff {
    pub fn new(base_delay: Duration, max_delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            max_attempts,
        }
    }

    /// Finite budget: 5 attempts, then the supervisor escalates.
    pub fn bounded() -> Self {
        Self::new(
            DEFAULT_BASE_DELAY,
            DEFAULT_MAX_DELAY,
            Some(DEFAULT_MAX_ATTEMPTS),
        )
    }

    /// Retry forever with the delay capped at the maximum.
    pub fn unbounded() -> Self {
        Self::new(DEFAULT_BASE_DELAY, DEFAULT_MAX_DELAY, None)
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        let delay = self.base_delay.saturating_mul(multiplier);
        delay.min(self.max_delay)
    }

    fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

/// Fixed delay retry policy.
///
/// Uses a constant delay between retry attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<u32>,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_attempts: Option<u32>) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

impl RetryPolicy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.delay
    }

    fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }
}

/// Outcome of consulting the backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    /// Attempt again, then wait at most this long for the link to come up.
    Retry(Duration),
    /// The attempt budget is used up.
    Exhausted { attempts: u32 },
}

/// Retry progress since the last successful connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffState {
    pub attempt: u32,
    pub current_delay: Duration,
}

impl BackoffState {
    pub fn initial(policy: &dyn RetryPolicy) -> Self {
        Self {
            attempt: 0,
            current_delay: policy.delay(0),
        }
    }

    /// Pure transition: the next state and what to do with it.
    pub fn advance(self, policy: &dyn RetryPolicy) -> (Self, RetryStep) {
        if !policy.should_retry(self.attempt) {
            return (
                self,
                RetryStep::Exhausted {
                    attempts: self.attempt,
                },
            );
        }
        let delay = policy.delay(self.attempt);
        let next = Self {
            attempt: self.attempt.saturating_add(1),
            current_delay: delay,
        };
        (next, RetryStep::Retry(delay))
    }
}

/// A retry policy together with its running state.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: Arc<dyn RetryPolicy>,
    state: BackoffState,
}

impl Backoff {
    pub fn new(policy: Arc<dyn RetryPolicy>) -> Self {
        let state = BackoffState::initial(policy.as_ref());
        Self { policy, state }
    }

    pub fn next_delay(&mut self) -> RetryStep {
        let (state, step) = self.state.advance(self.policy.as_ref());
        self.state = state;
        step
    }

    /// Back to attempt 0 and the initial delay.
    pub fn reset(&mut self) {
        self.state = BackoffState::initial(self.policy.as_ref());
    }

    pub fn state(&self) -> BackoffState {
        self.state
    }

    pub fn policy(&self) -> &dyn RetryPolicy {
        self.policy.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        !self.policy.should_retry(self.state.attempt)
    }
}

/// Period and tolerance of the link health check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheckPolicy {
    interval: Option<Duration>,
    unreachable_threshold: u32,
}

impl HealthCheckPolicy {
    /// Probe every `interval`; force a reconnect after
    /// `unreachable_threshold` consecutive unreachable probes.
    pub fn every(interval: Duration, unreachable_threshold: u32) -> Self {
        Self {
            interval: Some(interval),
            unreachable_threshold: unreachable_threshold.max(1),
        }
    }

    /// No health-check thread.
    pub fn disabled() -> Self {
        Self {
            interval: None,
            unreachable_threshold: 0,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn unreachable_threshold(&self) -> u32 {
        self.unreachable_threshold
    }

    pub fn is_enabled(&self) -> bool {
        self.interval.is_some()
    }
}

impl Default for HealthCheckPolicy {
    fn default() -> Self {
        Self::every(Duration::from_secs(5), 3)
    }
}
