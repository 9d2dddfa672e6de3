//! Tool invocation and result types.
//!
//! A [`ToolCall`] is one request to execute a tool with concrete parameters.
//! The call object itself is never mutated in place; the executing
//! implementation reflects status transitions in the [`ToolCallResult`] it
//! returns. The result invariant holds everywhere: `status == Completed`
//! exactly when `error` is empty, and a populated error implies a status in
//! {Failed, Timeout, Cancelled}.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ToolError, ToolErrorKind};

/// Lifecycle state of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Timeout,
    Cancelled,
}

impl ToolCallStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCallStatus::Pending => "pending",
            ToolCallStatus::Running => "running",
            ToolCallStatus::Completed => "completed",
            ToolCallStatus::Failed => "failed",
            ToolCallStatus::Timeout => "timeout",
            ToolCallStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ToolCallStatus::Pending | ToolCallStatus::Running)
    }
}

impl std::fmt::Display for ToolCallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<ToolErrorKind> for ToolCallStatus {
    fn from(kind: ToolErrorKind) -> Self {
        match kind {
            ToolErrorKind::Timeout => ToolCallStatus::Timeout,
            ToolErrorKind::Cancelled => ToolCallStatus::Cancelled,
            _ => ToolCallStatus::Failed,
        }
    }
}

/// A request to execute a tool with concrete parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call id (UUID v4 by default).
    pub id: String,
    pub tool_name: String,
    #[serde(default)]
    pub parameters: HashMap<String, Value>,
    #[serde(default = "ToolCall::initial_status")]
    pub status: ToolCallStatus,
    /// Override of the definition's default timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl ToolCall {
    fn initial_status() -> ToolCallStatus {
        ToolCallStatus::Pending
    }

    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tool_name: tool_name.into(),
            parameters: HashMap::new(),
            status: ToolCallStatus::Pending,
            timeout_seconds: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: f64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }
}

/// Outcome of one tool call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub call_id: String,
    pub tool_name: String,
    pub status: ToolCallStatus,
    /// JSON payload on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Structured error on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolError>,
    pub execution_time_ms: f64,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Attempt that produced this result, set by the retry wrapper.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
}

impl ToolCallResult {
    pub fn completed(call: &ToolCall, data: Value, execution_time_ms: f64) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.tool_name.clone(),
            status: ToolCallStatus::Completed,
            result: Some(data),
            error: None,
            execution_time_ms,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
            attempts: None,
        }
    }

    /// Build a failure result; the status is derived from the error kind.
    pub fn failed(call: &ToolCall, error: ToolError, execution_time_ms: f64) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.tool_name.clone(),
            status: ToolCallStatus::from(error.kind),
            result: None,
            error: Some(error),
            execution_time_ms,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
            attempts: None,
        }
    }

    pub fn cancelled(call: &ToolCall) -> Self {
        Self::failed(call, ToolError::cancelled(&call.tool_name), 0.0)
    }

    pub fn with_metadata(mut self, metadata: HashMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ToolCallStatus::Completed && self.error.is_none()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == ToolCallStatus::Cancelled
    }
}

/// What a tool body returns from `execute`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    #[serde(default)]
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ToolOutput {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            error: Some(error.into()),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Context passed to every tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Model that requested the call.
    pub model_id: String,
    #[serde(default)]
    pub conversation_turn: u32,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ExecutionContext {
    pub fn new(session_id: impl Into<String>, model_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
            model_id: model_id.into(),
            conversation_turn: 0,
            metadata: HashMap::new(),
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_turn(mut self, turn: u32) -> Self {
        self.conversation_turn = turn;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_builder() {
        let call = ToolCall::new("calculator")
            .with_arg("a", 2)
            .with_arg("b", 3)
            .with_timeout(5.0);

        assert_eq!(call.tool_name, "calculator");
        assert_eq!(call.status, ToolCallStatus::Pending);
        assert_eq!(call.parameters["a"], serde_json::json!(2));
        assert_eq!(call.timeout_seconds, Some(5.0));
        assert!(!call.id.is_empty());
    }

    #[test]
    fn test_completed_result_invariant() {
        let call = ToolCall::new("calculator");
        let result = ToolCallResult::completed(&call, serde_json::json!({"result": 5}), 12.0);

        assert!(result.is_success());
        assert!(result.error.is_none());
        assert_eq!(result.status, ToolCallStatus::Completed);
        assert_eq!(result.call_id, call.id);
    }

    #[test]
    fn test_failed_result_status_from_kind() {
        let call = ToolCall::new("slow_tool");

        let timed_out = ToolCallResult::failed(&call, ToolError::timeout("slow_tool", 1.0), 1000.0);
        assert_eq!(timed_out.status, ToolCallStatus::Timeout);

        let failed = ToolCallResult::failed(&call, ToolError::execution("slow_tool", "boom"), 3.0);
        assert_eq!(failed.status, ToolCallStatus::Failed);

        let cancelled = ToolCallResult::cancelled(&call);
        assert_eq!(cancelled.status, ToolCallStatus::Cancelled);
        assert!(cancelled.error.is_some());
        assert!(!cancelled.is_success());
    }

    #[test]
    fn test_tool_output_constructors() {
        let ok = ToolOutput::ok(serde_json::json!({"result": 5}));
        assert!(ok.success);
        assert!(ok.error.is_none());

        let fail = ToolOutput::fail("division by zero");
        assert!(!fail.success);
        assert_eq!(fail.error.as_deref(), Some("division by zero"));
    }

    #[test]
    fn test_status_terminal() {
        assert!(!ToolCallStatus::Pending.is_terminal());
        assert!(!ToolCallStatus::Running.is_terminal());
        assert!(ToolCallStatus::Completed.is_terminal());
        assert!(ToolCallStatus::Cancelled.is_terminal());
    }
}
