//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`RetryPolicy`] — attempt budget and exponential backoff for tool calls
//! - [`ParallelParams`] — fan-out bound for parallel execution

pub mod execution_params;

pub use execution_params::{ParallelParams, RetryPolicy};
