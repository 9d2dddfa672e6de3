//! Execution parameters — retry and fan-out control.
//!
//! [`RetryPolicy`] and [`ParallelParams`] group the static parameters that
//! control the call driver in [`call_tool`](crate::use_cases::call_tool).
//! These are application-layer concerns, not domain policy.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry control for a single tool call.
///
/// An attempt budget of `max_retries + 1` total attempts, with exponential
/// backoff between attempts. Terminal error kinds are never retried
/// regardless of the budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Backoff before the second attempt.
    #[serde(default = "default_initial_interval")]
    pub initial_interval: Duration,
    /// Multiplier applied to the interval after each attempt.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Cap on the backoff interval.
    #[serde(default = "default_max_interval")]
    pub max_interval: Duration,
}

fn default_max_retries() -> u32 {
    2
}

fn default_initial_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_max_interval() -> Duration {
    Duration::from_secs(10)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_interval: default_initial_interval(),
            backoff_factor: default_backoff_factor(),
            max_interval: default_max_interval(),
        }
    }
}

impl RetryPolicy {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    /// Backoff before attempt `attempt + 2` (0-based index of the completed
    /// attempt). Capped at `max_interval`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.max(1.0).powi(attempt as i32);
        let backoff = self.initial_interval.mul_f64(factor);
        backoff.min(self.max_interval)
    }
}

/// Fan-out control for parallel execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallelParams {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

fn default_max_concurrent() -> usize {
    5
}

impl Default for ParallelParams {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
        }
    }
}
