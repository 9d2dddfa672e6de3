//! Chain status and summary types.

use serde::{Deserialize, Serialize};

use crate::tool::ToolCallResult;

/// Lifecycle state of a whole chain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl ChainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainStatus::Pending => "pending",
            ChainStatus::Running => "running",
            ChainStatus::Completed => "completed",
            ChainStatus::Failed => "failed",
            ChainStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ChainStatus::Pending | ChainStatus::Running)
    }
}

impl std::fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate statistics over the results of one chain run.
///
/// Cancelled steps are counted separately: they are neither successes nor
/// errors in the rate calculations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
    pub cancelled_calls: usize,
    /// Fraction in [0, 1]; 0 when no calls ran.
    pub success_rate: f64,
    pub total_execution_time_ms: f64,
    /// 0 when no calls ran.
    pub average_execution_time_ms: f64,
}

impl ExecutionSummary {
    pub fn compute(results: &[ToolCallResult]) -> Self {
        let total_calls = results.len();
        let successful_calls = results.iter().filter(|r| r.is_success()).count();
        let cancelled_calls = results.iter().filter(|r| r.is_cancelled()).count();
        let failed_calls = total_calls - successful_calls - cancelled_calls;
        let total_execution_time_ms: f64 = results.iter().map(|r| r.execution_time_ms).sum();

        let (success_rate, average_execution_time_ms) = if total_calls == 0 {
            (0.0, 0.0)
        } else {
            (
                successful_calls as f64 / total_calls as f64,
                total_execution_time_ms / total_calls as f64,
            )
        };

        Self {
            total_calls,
            successful_calls,
            failed_calls,
            cancelled_calls,
            success_rate,
            total_execution_time_ms,
            average_execution_time_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{ToolCall, ToolError};
    use serde_json::json;

    #[test]
    fn test_empty_summary_is_all_zero() {
        let summary = ExecutionSummary::compute(&[]);
        assert_eq!(summary.total_calls, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert_eq!(summary.average_execution_time_ms, 0.0);
    }

    #[test]
    fn test_summary_counts_and_rates() {
        let call = ToolCall::new("calculator");
        let results = vec![
            ToolCallResult::completed(&call, json!(1), 100.0),
            ToolCallResult::completed(&call, json!(2), 200.0),
            ToolCallResult::failed(&call, ToolError::execution("calculator", "boom"), 60.0),
            ToolCallResult::cancelled(&call),
        ];

        let summary = ExecutionSummary::compute(&results);
        assert_eq!(summary.total_calls, 4);
        assert_eq!(summary.successful_calls, 2);
        assert_eq!(summary.failed_calls, 1);
        assert_eq!(summary.cancelled_calls, 1);
        assert_eq!(summary.success_rate, 0.5);
        assert_eq!(summary.total_execution_time_ms, 360.0);
        assert_eq!(summary.average_execution_time_ms, 90.0);
    }

    #[test]
    fn test_status_terminal() {
        assert!(!ChainStatus::Running.is_terminal());
        assert!(ChainStatus::Cancelled.is_terminal());
    }
}
